//! Represents a booking and its lifecycle state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of a booking.
///
/// Slot bookings start `Pending`, become `Quoted` once the provider names a
/// price, and end `Confirmed` or `Declined` by the client's decision.
/// Date-range reservations are created directly as `Confirmed` and never
/// move again. The state only advances; there are no backward transitions.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Quoted,
    Confirmed,
    Declined,
}

/// A booking row.
///
/// One table serves both flavors: `slot_id` is set for appointment-slot
/// bookings (which carry the request detail fields and walk the lifecycle)
/// and NULL for plain date-range reservations. In both cases `start_date`
/// and `end_date` describe the occupied window, so the overlap check can
/// treat every row uniformly.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Primary key.
    pub booking_id: i64,

    /// The client who booked.
    pub user_id: i64,

    /// The spot being booked (copied from the slot for slot bookings).
    pub spot_id: i64,

    /// Consumed slot, when this is an appointment booking.
    pub slot_id: Option<i64>,

    /// First occupied date (inclusive).
    pub start_date: NaiveDate,

    /// Last occupied date (inclusive).
    pub end_date: NaiveDate,

    /// Current lifecycle state.
    pub status: BookingStatus,

    /// Price quoted by the provider, once set.
    pub price: Option<f64>,

    /// Platform commission retained from the quoted price.
    pub commission_amount: Option<f64>,

    /// Requested size (slot bookings only).
    pub size_id: Option<i64>,

    /// Requested placement (slot bookings only).
    pub placement_id: Option<i64>,

    /// Whether the client asked for color work (slot bookings only).
    pub is_color: Option<bool>,

    /// Reference image supplied by the client.
    #[serde(rename = "referenceURL")]
    pub reference_url: Option<String>,

    /// Free-form note from the client.
    pub comment: Option<String>,

    /// When the booking was created.
    pub created_at: DateTime<Utc>,
}
