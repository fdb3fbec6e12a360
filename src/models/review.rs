//! Represents a review left for a completed booking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A review tied to exactly one booking.
///
/// Only the booking's client may write it, and the UNIQUE constraint on
/// `booking_id` caps it at one review per booking.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Primary key.
    pub review_id: i64,

    /// The author (always the booking's client).
    pub user_id: i64,

    /// The reviewed booking.
    pub booking_id: i64,

    /// Star rating, 1 through 5.
    pub rating: i64,

    /// Optional free-form text.
    pub comment: Option<String>,

    /// When the review was submitted.
    pub created_at: DateTime<Utc>,
}
