//! Represents a catalog style tag.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A categorical tag spots are filtered by. Read-only reference data.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub style_id: i64,
    pub style_name: String,
    pub description: Option<String>,
}
