use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::db::{closed_store, memory_store, DynRideStore};
use crate::engine::Engine;
use crate::entities::{Coordinates, PlannedRoute, Roster, Route, Waypoint};
use crate::error::{geocode_error, route_provider_error, Error};
use crate::external::{Geocoder, RoutePlanner};

/// Resolves every address to `(address.len(), 0.0)` unless told to fail on it.
#[derive(Default)]
pub struct StubGeocoder {
    pub calls: Arc<AtomicUsize>,
    pub fail_on: Option<String>,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinates, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_on.as_deref() == Some(address) {
            return Err(geocode_error("ZERO_RESULTS"));
        }

        Ok(Coordinates {
            latitude: address.len() as f64,
            longitude: 0.0,
        })
    }
}

pub enum StubPlanner {
    Route(f64),
    NoRoute,
    Fail,
}

impl StubPlanner {
    pub fn route(distance_meters: f64) -> Self {
        StubPlanner::Route(distance_meters)
    }
}

#[async_trait]
impl RoutePlanner for StubPlanner {
    async fn plan(
        &self,
        _origin: Waypoint,
        _destination: Waypoint,
    ) -> Result<Option<PlannedRoute>, Error> {
        match self {
            StubPlanner::Route(distance_meters) => Ok(Some(PlannedRoute {
                route: Route {
                    distance_meters: *distance_meters,
                    duration: "900s".into(),
                    polyline: "_p~iF~ps|U".into(),
                },
                response: json!({
                    "routes": [{
                        "distanceMeters": distance_meters,
                        "duration": "900s",
                        "polyline": { "encodedPolyline": "_p~iF~ps|U" }
                    }]
                }),
            })),
            StubPlanner::NoRoute => Ok(None),
            StubPlanner::Fail => Err(route_provider_error("503 Service Unavailable")),
        }
    }
}

fn engine_over(geocoder: StubGeocoder, planner: StubPlanner, store: DynRideStore) -> Engine {
    Engine::new(Arc::new(geocoder), Arc::new(planner), store, Roster::default())
}

pub async fn engine_with(geocoder: StubGeocoder, planner: StubPlanner) -> Engine {
    engine_over(geocoder, planner, Arc::new(memory_store().await))
}

/// An engine whose ride store fails every call.
pub async fn engine_with_broken_store() -> Engine {
    engine_over(
        StubGeocoder::default(),
        StubPlanner::NoRoute,
        Arc::new(closed_store().await),
    )
}
