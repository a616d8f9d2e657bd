use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_meters: f64,
    /// Provider encoded, e.g. `"1234s"`.
    pub duration: String,
    pub polyline: String,
}

impl Route {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }
}

/// The selected route together with the raw provider payload it came from.
#[derive(Clone, Debug)]
pub struct PlannedRoute {
    pub route: Route,
    pub response: Value,
}
