//! Represents a discrete bookable time slot published by a provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single appointment slot.
///
/// At most one live booking may consume a slot; `is_booked` is the flag the
/// booking engine flips under a conditional update so two clients can never
/// take the same slot.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Primary key.
    pub slot_id: i64,

    /// The spot this slot belongs to.
    pub spot_id: i64,

    /// When the appointment starts.
    pub starts_at: DateTime<Utc>,

    /// Appointment length in minutes.
    pub duration_minutes: i64,

    /// Whether a booking currently holds this slot.
    pub is_booked: bool,
}
