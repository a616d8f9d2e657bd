use super::validators::{
    validate_customer_id, validate_driver_and_distance, validate_driver_id, validate_ride_data,
};
use super::Engine;

use async_trait::async_trait;

use crate::{
    api::RideAPI,
    entities::{Confirmation, DriverRef, NewRide, Ride},
    error::{invalid_data_error, no_rides_found_error, Error},
};

fn non_negative(value: Option<f64>, field: &str) -> Result<f64, Error> {
    match value {
        Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Some(_) => Err(invalid_data_error(format!(
            "{} must be a non-negative number",
            field
        ))),
        None => Err(invalid_data_error(format!("{} is required", field))),
    }
}

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn confirm_ride(&self, confirmation: Confirmation) -> Result<Ride, Error> {
        let Confirmation {
            customer_id,
            origin,
            destination,
            distance,
            duration,
            driver,
            value,
        } = confirmation;

        validate_ride_data(
            customer_id.as_deref(),
            origin.as_deref(),
            destination.as_deref(),
        )?;

        let distance = non_negative(distance, "distance")?;
        let price = non_negative(value, "value")?;
        let duration = duration
            .filter(|duration| !duration.trim().is_empty())
            .ok_or_else(|| invalid_data_error("duration is required"))?;
        let driver = driver.ok_or_else(|| invalid_data_error("driver is required"))?;

        let driver = validate_driver_and_distance(&self.roster, driver.id, distance)?;

        // any client supplied driver name is ignored in favour of the roster's
        let ride = NewRide {
            customer_id: customer_id.unwrap_or_default(),
            origin: origin.unwrap_or_default(),
            destination: destination.unwrap_or_default(),
            distance,
            duration,
            driver: DriverRef {
                id: driver.id,
                name: driver.name.clone(),
            },
            price,
        };

        self.store.append(ride).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides(
        &self,
        customer_id: String,
        driver_id: Option<String>,
    ) -> Result<Vec<Ride>, Error> {
        validate_customer_id(&customer_id)?;

        let driver_id = match driver_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(validate_driver_id(&self.roster, raw)?),
            _ => None,
        };

        let rides = self.store.find_by_customer(&customer_id, driver_id).await?;

        if rides.is_empty() {
            tracing::info!("no rides found");
            return Err(no_rides_found_error());
        }

        Ok(rides)
    }
}

#[cfg(test)]
fn confirmation(customer_id: &str, driver_id: i64, distance: f64) -> Confirmation {
    Confirmation {
        customer_id: Some(customer_id.into()),
        origin: Some("Origin St, 1".into()),
        destination: Some("Destination Av, 2".into()),
        distance: Some(distance),
        duration: Some("1500s".into()),
        driver: Some(DriverRef {
            id: driver_id,
            name: "whoever".into(),
        }),
        value: Some(42.0),
    }
}

#[tokio::test]
async fn confirm_then_list() {
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let engine = engine_with(StubGeocoder::default(), StubPlanner::NoRoute).await;

    let err = engine.list_rides("c1".into(), None).await.unwrap_err();
    assert_eq!(err.code, "NO_RIDES_FOUND");

    let saved = engine.confirm_ride(confirmation("c1", 2, 12.0)).await.unwrap();
    assert_eq!(saved.driver.name, "Dominic Toretto");

    let rides = engine.list_rides("c1".into(), None).await.unwrap();
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].id, saved.id);
    assert_eq!(rides[0].customer_id, "c1");
    assert_eq!(rides[0].origin, "Origin St, 1");
    assert_eq!(rides[0].destination, "Destination Av, 2");
    assert_eq!(rides[0].distance, 12.0);
    assert_eq!(rides[0].driver.id, 2);
    assert_eq!(rides[0].price, 42.0);
}

#[tokio::test]
async fn confirm_rejects_unknown_driver_and_short_distance() {
    use crate::error::Kind;
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let engine = engine_with(StubGeocoder::default(), StubPlanner::NoRoute).await;

    let err = engine
        .confirm_ride(confirmation("c1", 99, 12.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, "DRIVER_NOT_FOUND");
    assert_eq!(err.kind, Kind::NotFound);

    let err = engine
        .confirm_ride(confirmation("c1", 3, 4.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_DISTANCE");
    assert_eq!(err.kind, Kind::DomainRule);

    let err = engine.list_rides("c1".into(), None).await.unwrap_err();
    assert_eq!(err.code, "NO_RIDES_FOUND");
}

#[tokio::test]
async fn confirm_requires_every_field() {
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let engine = engine_with(StubGeocoder::default(), StubPlanner::NoRoute).await;

    let mut missing_driver = confirmation("c1", 1, 12.0);
    missing_driver.driver = None;

    let mut missing_duration = confirmation("c1", 1, 12.0);
    missing_duration.duration = None;

    let mut negative_value = confirmation("c1", 1, 12.0);
    negative_value.value = Some(-1.0);

    let mut same_addresses = confirmation("c1", 1, 12.0);
    same_addresses.destination = same_addresses.origin.clone();

    for invalid in [
        Confirmation::default(),
        missing_driver,
        missing_duration,
        negative_value,
        same_addresses,
    ] {
        let err = engine.confirm_ride(invalid).await.unwrap_err();
        assert_eq!(err.code, "INVALID_DATA");
    }
}

#[tokio::test]
async fn list_filters_by_driver() {
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let engine = engine_with(StubGeocoder::default(), StubPlanner::NoRoute).await;

    engine.confirm_ride(confirmation("c1", 1, 12.0)).await.unwrap();
    let latest = engine.confirm_ride(confirmation("c1", 2, 12.0)).await.unwrap();

    let rides = engine.list_rides("c1".into(), Some("2".into())).await.unwrap();
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].id, latest.id);

    let rides = engine.list_rides("c1".into(), Some("".into())).await.unwrap();
    assert_eq!(rides.len(), 2);
    assert_eq!(rides[0].id, latest.id);

    let err = engine
        .list_rides("c1".into(), Some("3".into()))
        .await
        .unwrap_err();
    assert_eq!(err.code, "NO_RIDES_FOUND");

    let err = engine
        .list_rides("c1".into(), Some("7".into()))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_DRIVER");

    let err = engine.list_rides(" ".into(), None).await.unwrap_err();
    assert_eq!(err.code, "INVALID_DATA");
}

#[tokio::test]
async fn store_failures_surface_as_persistence_errors() {
    use crate::error::Kind;
    use crate::test_support::engine_with_broken_store;

    let engine = engine_with_broken_store().await;

    let err = engine
        .confirm_ride(confirmation("c1", 1, 12.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind, Kind::Persistence);
    assert_eq!(err.message, "failed to save the ride");

    let err = engine.list_rides("c1".into(), None).await.unwrap_err();
    assert_eq!(err.kind, Kind::Persistence);
    assert_eq!(err.message, "failed to fetch rides");
}
