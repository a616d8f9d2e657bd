use serde::Serialize;
use serde_json::Value;

use crate::entities::{Coordinates, Quote};

#[derive(Clone, Debug, Serialize)]
pub struct Estimate {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub distance: f64,
    pub duration: String,
    pub options: Vec<Quote>,
    #[serde(rename = "routeResponse")]
    pub route_response: Value,
}
