mod estimate_api;
mod ride_api;

pub mod quotes;
pub mod validators;

use crate::{
    api::API,
    db::DynRideStore,
    entities::Roster,
    external::{DynGeocoder, DynRoutePlanner},
};

/// Runs the estimate, confirm and history pipelines over the injected
/// mapping adapters, ride store and driver roster.
pub struct Engine {
    geocoder: DynGeocoder,
    planner: DynRoutePlanner,
    store: DynRideStore,
    roster: Roster,
}

impl Engine {
    pub fn new(
        geocoder: DynGeocoder,
        planner: DynRoutePlanner,
        store: DynRideStore,
        roster: Roster,
    ) -> Self {
        Self {
            geocoder,
            planner,
            store,
            roster,
        }
    }
}

impl API for Engine {}
