//! Represents a catalog city.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A city spots can be located in. Read-only reference data.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub city_id: i64,
    pub name: String,
    pub country_name: String,
}
