use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Either end of a route request.
#[derive(Clone, Debug, PartialEq)]
pub enum Waypoint {
    Coordinates(Coordinates),
    Address(String),
}

impl From<Coordinates> for Waypoint {
    fn from(coordinates: Coordinates) -> Self {
        Waypoint::Coordinates(coordinates)
    }
}
