use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverRef {
    pub id: i64,
    /// Optional on confirmation; the roster name is what gets stored.
    #[serde(default)]
    pub name: String,
}

/// A confirmed ride as stored. `customer_id` is left out of the JSON form
/// because history responses already carry it at the top level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ride {
    pub id: i64,
    #[serde(skip_serializing)]
    pub customer_id: String,
    pub origin: String,
    pub destination: String,
    pub distance: f64,
    pub duration: String,
    pub driver: DriverRef,
    #[serde(rename = "value")]
    pub price: f64,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
}

/// A ride that passed validation and is ready to be appended.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRide {
    pub customer_id: String,
    pub origin: String,
    pub destination: String,
    pub distance: f64,
    pub duration: String,
    pub driver: DriverRef,
    pub price: f64,
}

/// Body of a confirmation request. Every field is optional so that missing
/// ones are reported as invalid data instead of a decode failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Confirmation {
    pub customer_id: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance: Option<f64>,
    pub duration: Option<String>,
    pub driver: Option<DriverRef>,
    pub value: Option<f64>,
}

#[test]
fn ride_serializes_in_history_shape() {
    use chrono::TimeZone;

    let ride = Ride {
        id: 1,
        customer_id: "12345".into(),
        origin: "Curitiba, PR".into(),
        destination: "São Paulo, SP".into(),
        distance: 416.156,
        duration: "20335s".into(),
        driver: DriverRef {
            id: 1,
            name: "Homer Simpson".into(),
        },
        price: 1040.39,
        created_at: Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap(),
    };

    let json = serde_json::to_value(&ride).unwrap();

    assert!(json.get("customer_id").is_none());
    assert_eq!(json["value"], 1040.39);
    assert_eq!(json["driver"]["name"], "Homer Simpson");
    assert_eq!(json["date"], "2024-11-20T12:00:00Z");
}
