mod driver;
mod estimate;
mod location;
mod quote;
mod ride;
mod route;

pub use driver::{Driver, Review, Roster};
pub use estimate::Estimate;
pub use location::{Coordinates, Waypoint};
pub use quote::Quote;
pub use ride::{Confirmation, DriverRef, NewRide, Ride};
pub use route::{PlannedRoute, Route};
