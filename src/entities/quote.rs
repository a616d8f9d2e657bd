use serde::{Deserialize, Serialize};

use crate::entities::Review;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub vehicle: String,
    pub review: Review,
    #[serde(rename = "value")]
    pub price: f64,
}
