use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::entities::{Confirmation, Estimate, Ride};
use crate::error::{invalid_data_error, Error};

#[derive(Serialize, Deserialize)]
pub struct EstimateParams {
    customer_id: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    driver_id: Option<String>,
}

#[derive(Serialize)]
pub struct ConfirmResponse {
    success: bool,
    description: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse {
    customer_id: String,
    rides: Vec<Ride>,
}

pub async fn estimate(
    Extension(api): Extension<DynAPI>,
    params: Result<Json<EstimateParams>, JsonRejection>,
) -> Result<Json<Estimate>, Error> {
    let Json(params) = params.map_err(|rejection| invalid_data_error(rejection.body_text()))?;

    let estimate = api
        .estimate_ride(params.customer_id, params.origin, params.destination)
        .await?;

    Ok(estimate.into())
}

pub async fn confirm(
    Extension(api): Extension<DynAPI>,
    params: Result<Json<Confirmation>, JsonRejection>,
) -> Result<Json<ConfirmResponse>, Error> {
    let Json(confirmation) =
        params.map_err(|rejection| invalid_data_error(rejection.body_text()))?;

    api.confirm_ride(confirmation).await?;

    Ok(ConfirmResponse {
        success: true,
        description: "ride confirmed",
    }
    .into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Path(customer_id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, Error> {
    let Query(params) = params.map_err(|rejection| invalid_data_error(rejection.body_text()))?;

    let rides = api.list_rides(customer_id.clone(), params.driver_id).await?;

    Ok(ListResponse { customer_id, rides }.into())
}
