pub mod google_maps;

use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{Coordinates, PlannedRoute, Waypoint};
use crate::error::Error;

#[async_trait]
pub trait Geocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinates, Error>;
}

#[async_trait]
pub trait RoutePlanner {
    /// `Ok(None)` means the provider answered but had no route to offer.
    async fn plan(
        &self,
        origin: Waypoint,
        destination: Waypoint,
    ) -> Result<Option<PlannedRoute>, Error>;
}

pub type DynGeocoder = Arc<dyn Geocoder + Send + Sync>;
pub type DynRoutePlanner = Arc<dyn RoutePlanner + Send + Sync>;
