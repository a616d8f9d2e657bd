use crate::entities::{Driver, Roster};
use crate::error::{
    driver_not_found_error, invalid_data_error, invalid_distance_error, invalid_driver_error,
    Error,
};

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Checks the fields shared by estimate and confirm requests.
pub fn validate_ride_data(
    customer_id: Option<&str>,
    origin: Option<&str>,
    destination: Option<&str>,
) -> Result<(), Error> {
    if is_blank(customer_id) {
        return Err(invalid_data_error("the customer id is required"));
    }

    if is_blank(origin) || is_blank(destination) {
        return Err(invalid_data_error(
            "the origin and destination addresses are required",
        ));
    }

    if origin == destination {
        return Err(invalid_data_error(
            "the origin and destination cannot be the same",
        ));
    }

    Ok(())
}

pub fn validate_driver_and_distance<'r>(
    roster: &'r Roster,
    driver_id: i64,
    distance_km: f64,
) -> Result<&'r Driver, Error> {
    let driver = roster.find(driver_id).ok_or_else(driver_not_found_error)?;

    if !driver.accepts(distance_km) {
        return Err(invalid_distance_error(driver.min_km));
    }

    Ok(driver)
}

pub fn validate_customer_id(customer_id: &str) -> Result<(), Error> {
    if is_blank(Some(customer_id)) {
        return Err(invalid_data_error("the customer id is required"));
    }

    Ok(())
}

/// `raw` comes straight from the query string.
pub fn validate_driver_id(roster: &Roster, raw: &str) -> Result<i64, Error> {
    let id: i64 = raw.trim().parse().map_err(|_| invalid_driver_error())?;

    roster.find(id).ok_or_else(invalid_driver_error)?;

    Ok(id)
}

#[test]
fn missing_fields_are_invalid_data() {
    let cases = [
        (None, Some("A"), Some("B")),
        (Some(""), Some("A"), Some("B")),
        (Some("c1"), None, Some("B")),
        (Some("c1"), Some("A"), None),
        (Some("c1"), Some("  "), Some("B")),
    ];

    for (customer_id, origin, destination) in cases {
        let err = validate_ride_data(customer_id, origin, destination).unwrap_err();
        assert_eq!(err.code, "INVALID_DATA");
    }

    assert!(validate_ride_data(Some("c1"), Some("A"), Some("B")).is_ok());
}

#[test]
fn equal_addresses_always_fail() {
    for customer_id in [None, Some(""), Some("c1")] {
        let err = validate_ride_data(customer_id, Some("Rua A, 1"), Some("Rua A, 1")).unwrap_err();
        assert_eq!(err.code, "INVALID_DATA");
    }
}

#[test]
fn driver_and_distance_failures_are_distinct() {
    let roster = Roster::default();

    let err = validate_driver_and_distance(&roster, 99, 100.0).unwrap_err();
    assert_eq!(err.code, "DRIVER_NOT_FOUND");

    let err = validate_driver_and_distance(&roster, 3, 9.9).unwrap_err();
    assert_eq!(err.code, "INVALID_DISTANCE");

    let driver = validate_driver_and_distance(&roster, 3, 10.0).unwrap();
    assert_eq!(driver.name, "James Bond");
}

#[test]
fn history_lookup_checks() {
    let roster = Roster::default();

    assert!(validate_customer_id("12345").is_ok());
    assert_eq!(validate_customer_id("").unwrap_err().code, "INVALID_DATA");

    assert_eq!(validate_driver_id(&roster, "2").unwrap(), 2);
    assert_eq!(validate_driver_id(&roster, "9").unwrap_err().code, "INVALID_DRIVER");
    assert_eq!(validate_driver_id(&roster, "abc").unwrap_err().code, "INVALID_DRIVER");
}
