use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{Confirmation, Estimate, Ride};
use crate::error::Error;

#[async_trait]
pub trait EstimateAPI {
    async fn estimate_ride(
        &self,
        customer_id: Option<String>,
        origin: Option<String>,
        destination: Option<String>,
    ) -> Result<Estimate, Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn confirm_ride(&self, confirmation: Confirmation) -> Result<Ride, Error>;

    async fn list_rides(
        &self,
        customer_id: String,
        driver_id: Option<String>,
    ) -> Result<Vec<Ride>, Error>;
}

pub trait API: EstimateAPI + RideAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
