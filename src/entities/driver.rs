use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{config_error, Error};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: u8,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub vehicle: String,
    pub review: Review,
    pub rate_per_km: f64,
    pub min_km: f64,
}

impl Driver {
    pub fn accepts(&self, distance_km: f64) -> bool {
        distance_km >= self.min_km
    }
}

/// The fixed set of drivers a quote can be made for. Read-only once built,
/// so clones share the same table.
#[derive(Clone, Debug)]
pub struct Roster {
    drivers: Arc<[Driver]>,
}

impl Roster {
    pub fn new(drivers: Vec<Driver>) -> Result<Self, Error> {
        let mut ids = HashSet::new();

        for driver in &drivers {
            if !ids.insert(driver.id) {
                return Err(config_error(format!("duplicate driver id {}", driver.id)));
            }
            if !(driver.rate_per_km > 0.0) {
                return Err(config_error(format!(
                    "driver {} must have a positive rate per km",
                    driver.id
                )));
            }
            if !(driver.min_km >= 0.0) {
                return Err(config_error(format!(
                    "driver {} must have a non-negative minimum distance",
                    driver.id
                )));
            }
            if !(1..=5).contains(&driver.review.rating) {
                return Err(config_error(format!(
                    "driver {} rating must be between 1 and 5",
                    driver.id
                )));
            }
        }

        Ok(Self {
            drivers: drivers.into(),
        })
    }

    #[tracing::instrument]
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .map_err(|err| config_error(format!("cannot read {}: {}", path.display(), err)))?;
        let drivers: Vec<Driver> = serde_json::from_str(&contents)
            .map_err(|err| config_error(format!("cannot parse {}: {}", path.display(), err)))?;

        tracing::info!(count = drivers.len(), "loaded driver roster");

        Self::new(drivers)
    }

    pub fn find(&self, id: i64) -> Option<&Driver> {
        self.drivers.iter().find(|driver| driver.id == id)
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }
}

impl Default for Roster {
    fn default() -> Self {
        let drivers = vec![
            Driver {
                id: 1,
                name: "Homer Simpson".into(),
                description: "Friendly driver with donuts and good laughs.".into(),
                vehicle: "Pink 1973 Plymouth Valiant".into(),
                review: Review {
                    rating: 2,
                    comment: "Nice guy, but the car smells of donuts.".into(),
                },
                rate_per_km: 2.5,
                min_km: 1.0,
            },
            Driver {
                id: 2,
                name: "Dominic Toretto".into(),
                description: "Safe ride with a special playlist.".into(),
                vehicle: "1970 Dodge Charger R/T".into(),
                review: Review {
                    rating: 4,
                    comment: "Amazing car, super friendly driver.".into(),
                },
                rate_per_km: 5.0,
                min_km: 5.0,
            },
            Driver {
                id: 3,
                name: "James Bond".into(),
                description: "A smooth and discreet ride worthy of a secret agent.".into(),
                vehicle: "Aston Martin DB5".into(),
                review: Review {
                    rating: 5,
                    comment: "Flawless service, a magnificent experience.".into(),
                },
                rate_per_km: 10.0,
                min_km: 10.0,
            },
        ];

        Self {
            drivers: drivers.into(),
        }
    }
}

#[test]
fn default_roster_is_valid() {
    let roster = Roster::default();

    assert_eq!(roster.drivers().len(), 3);
    assert!(Roster::new(roster.drivers().to_vec()).is_ok());
    assert_eq!(roster.find(2).map(|d| d.name.as_str()), Some("Dominic Toretto"));
    assert!(roster.find(4).is_none());
}

#[test]
fn roster_rejects_invalid_drivers() {
    let base = Roster::default().drivers()[0].clone();

    let duplicate = vec![base.clone(), base.clone()];
    assert!(Roster::new(duplicate).is_err());

    let mut free_ride = base.clone();
    free_ride.rate_per_km = 0.0;
    assert!(Roster::new(vec![free_ride]).is_err());

    let mut negative_min = base.clone();
    negative_min.min_km = -1.0;
    assert!(Roster::new(vec![negative_min]).is_err());

    let mut bad_rating = base;
    bad_rating.review.rating = 6;
    assert!(Roster::new(vec![bad_rating]).is_err());
}

#[test]
fn roster_loads_from_json() {
    let path = std::env::temp_dir().join(format!("roster-{}.json", std::process::id()));
    fs::write(
        &path,
        r#"[{"id": 7, "name": "Ayrton", "description": "fast", "vehicle": "McLaren",
            "review": {"rating": 5, "comment": "quick"}, "rate_per_km": 3.0, "min_km": 2.0}]"#,
    )
    .unwrap();

    let roster = Roster::from_json_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(roster.drivers().len(), 1);
    assert_eq!(roster.find(7).unwrap().rate_per_km, 3.0);
}
