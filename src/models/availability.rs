//! Represents a published availability window for a spot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An inclusive date window during which a spot accepts bookings.
///
/// Windows are informational for clients browsing a spot; the booking
/// conflict check runs against existing bookings, not against these rows.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// Primary key.
    pub availability_id: i64,

    /// The spot this window belongs to.
    pub spot_id: i64,

    /// First available date (inclusive).
    pub date_from: NaiveDate,

    /// Last available date (inclusive). Always after `date_from`.
    pub date_to: NaiveDate,
}
