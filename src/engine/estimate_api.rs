use super::quotes::quote;
use super::validators::validate_ride_data;
use super::Engine;

use async_trait::async_trait;

use crate::{
    api::EstimateAPI,
    entities::{Estimate, Waypoint},
    error::{route_not_found_error, Error},
};

#[async_trait]
impl EstimateAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn estimate_ride(
        &self,
        customer_id: Option<String>,
        origin: Option<String>,
        destination: Option<String>,
    ) -> Result<Estimate, Error> {
        validate_ride_data(
            customer_id.as_deref(),
            origin.as_deref(),
            destination.as_deref(),
        )?;

        let origin = origin.unwrap_or_default();
        let destination = destination.unwrap_or_default();

        let (origin_coordinates, destination_coordinates) = futures::try_join!(
            self.geocoder.resolve(&origin),
            self.geocoder.resolve(&destination)
        )?;

        let planned = self
            .planner
            .plan(
                Waypoint::from(origin_coordinates),
                Waypoint::from(destination_coordinates),
            )
            .await?;

        let planned = match planned {
            Some(planned) => planned,
            None => {
                tracing::info!("provider returned no route");
                return Err(route_not_found_error());
            }
        };

        let distance = planned.route.distance_km();
        let options = quote(&self.roster, distance);

        tracing::info!(distance, options = options.len(), "ride estimated");

        Ok(Estimate {
            origin: origin_coordinates,
            destination: destination_coordinates,
            distance,
            duration: planned.route.duration,
            options,
            route_response: planned.response,
        })
    }
}

#[cfg(test)]
fn some(value: &str) -> Option<String> {
    Some(value.into())
}

#[tokio::test]
async fn estimate_quotes_all_drivers_for_long_trip() {
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let engine = engine_with(StubGeocoder::default(), StubPlanner::route(12_000.0)).await;

    let estimate = engine
        .estimate_ride(some("c1"), some("Origin St, 1"), some("Destination Av, 2"))
        .await
        .unwrap();

    assert_eq!(estimate.distance, 12.0);
    assert_eq!(estimate.duration, "900s");
    assert_eq!(estimate.origin.latitude, "Origin St, 1".len() as f64);
    assert_eq!(estimate.destination.latitude, "Destination Av, 2".len() as f64);

    let prices: Vec<f64> = estimate.options.iter().map(|q| q.price).collect();
    assert_eq!(prices, vec![30.0, 60.0, 120.0]);
    assert_eq!(estimate.route_response["routes"][0]["distanceMeters"], 12_000.0);
}

#[tokio::test]
async fn invalid_request_never_reaches_provider() {
    use std::sync::atomic::Ordering;
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let geocoder = StubGeocoder::default();
    let calls = geocoder.calls.clone();
    let engine = engine_with(geocoder, StubPlanner::route(12_000.0)).await;

    let err = engine
        .estimate_ride(some("c1"), some("Same St"), some("Same St"))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_DATA");

    let err = engine
        .estimate_ride(None, some("A"), some("B"))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_DATA");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_route_is_not_found() {
    use crate::error::Kind;
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let engine = engine_with(StubGeocoder::default(), StubPlanner::NoRoute).await;

    let err = engine
        .estimate_ride(some("c1"), some("A"), some("B"))
        .await
        .unwrap_err();

    assert_eq!(err.code, "ROUTE_NOT_FOUND");
    assert_eq!(err.kind, Kind::NotFound);
}

#[tokio::test]
async fn provider_failures_are_upstream_errors() {
    use crate::error::Kind;
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let geocoder = StubGeocoder {
        fail_on: Some("Nowhere".into()),
        ..Default::default()
    };
    let engine = engine_with(geocoder, StubPlanner::route(5_000.0)).await;

    let err = engine
        .estimate_ride(some("c1"), some("A"), some("Nowhere"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, Kind::Geocode);
    assert_eq!(err.code, "ROUTE_CALCULATION_ERROR");

    let engine = engine_with(StubGeocoder::default(), StubPlanner::Fail).await;

    let err = engine
        .estimate_ride(some("c1"), some("A"), some("B"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, Kind::RouteProvider);
    assert_eq!(err.code, "ROUTE_CALCULATION_ERROR");
}

#[tokio::test]
async fn short_trip_with_no_eligible_driver_is_empty() {
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};

    let engine = engine_with(StubGeocoder::default(), StubPlanner::route(500.0)).await;

    let estimate = engine
        .estimate_ride(some("c1"), some("A"), some("B"))
        .await
        .unwrap();

    assert!(estimate.options.is_empty());
}
