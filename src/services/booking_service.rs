//! src/services/booking_service.rs
//!
//! BookingService — the conflict-checked booking engine plus everything that
//! hangs off it: the quote → confirm/decline lifecycle, published
//! availability windows, appointment slots, and reviews. Every multi-step
//! mutation runs inside a single transaction, and the two admission paths
//! (range overlap, slot flag) are guarded at the statement level so racing
//! requests serialize in the database instead of double-booking.

use crate::models::{
    availability::Availability,
    booking::{Booking, BookingStatus},
    review::Review,
    slot::Slot,
};
use crate::services::{
    ServiceError, ServiceResult, ensure_owner, is_unique_violation, parse_date, parse_datetime,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Client input for a date-range reservation.
#[derive(Debug, Default)]
pub struct RangeBookingInput {
    pub spot_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Client input for an appointment-slot booking.
#[derive(Debug, Default)]
pub struct SlotBookingInput {
    pub slot_id: Option<i64>,
    pub size_id: Option<i64>,
    pub placement_id: Option<i64>,
    pub is_color: Option<bool>,
    pub reference_url: Option<String>,
    pub comment: Option<String>,
}

/// Lifecycle input for PATCH on a booking. The provider sends `price`, the
/// client sends `action` ("confirm" or "decline").
#[derive(Debug, Default)]
pub struct BookingUpdate {
    pub price: Option<f64>,
    pub action: Option<String>,
}

/// One row of the caller's booking list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBooking {
    pub booking_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub price: Option<f64>,
    pub spot: MyBookingSpot,
}

/// Spot summary nested in a booking list row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBookingSpot {
    pub spot_id: i64,
    pub city_name: Option<String>,
}

#[derive(FromRow)]
struct MyBookingRow {
    booking_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: BookingStatus,
    price: Option<f64>,
    spot_id: i64,
    city_name: Option<String>,
}

/// Booking joined with the owning spot's user, for party checks.
#[derive(FromRow)]
struct BookingParties {
    booking_id: i64,
    user_id: i64,
    slot_id: Option<i64>,
    status: BookingStatus,
    price: Option<f64>,
    owner_id: i64,
}

/// Share of a quoted price retained by the platform.
const COMMISSION_RATE: f64 = 0.10;

/// BookingService owns every write against bookings, slots, and availability
/// windows:
/// - Range reservations are admitted by an overlap check folded into the
///   insert statement itself, so two racing clients cannot double-book.
/// - Slot bookings consume a published slot under a conditional update on
///   its `is_booked` flag.
/// - The quote → confirm/decline lifecycle only ever moves forward; a
///   decline releases the consumed slot in the same transaction.
#[derive(Clone)]
pub struct BookingService {
    /// Shared SQLite connection pool.
    db: Arc<SqlitePool>,
}

impl BookingService {
    /// Create a new BookingService backed by the provided SQLite pool.
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create a date-range reservation against a spot.
    ///
    /// - Requires spotId, startDate, and endDate; dates are ISO `YYYY-MM-DD`
    ///   and the start may not come after the end.
    /// - Conflicts with any non-declined booking whose window overlaps the
    ///   request, inclusive on both ends.
    /// - The overlap test runs in the same guarded INSERT as the write, so a
    ///   concurrent request cannot slip between check and insert.
    ///
    /// Range reservations take effect immediately: the row is created
    /// `confirmed` and never enters the quote lifecycle.
    pub async fn create_range_booking(
        &self,
        user_id: i64,
        input: RangeBookingInput,
    ) -> ServiceResult<Booking> {
        let (Some(spot_id), Some(start_raw), Some(end_raw)) = (
            input.spot_id,
            input.start_date.as_deref(),
            input.end_date.as_deref(),
        ) else {
            return Err(ServiceError::Validation(
                "Missing required fields: spotId, startDate, and endDate are needed.".into(),
            ));
        };

        let start_date = parse_date(start_raw)?;
        let end_date = parse_date(end_raw)?;
        if start_date > end_date {
            return Err(ServiceError::Validation(
                "Start date must be before end date.".into(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let spot = sqlx::query_scalar::<_, i64>("SELECT spot_id FROM spots WHERE spot_id = ?")
            .bind(spot_id)
            .fetch_optional(&mut *tx)
            .await?;
        if spot.is_none() {
            return Err(ServiceError::NotFound("Spot not found".into()));
        }

        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (user_id, spot_id, start_date, end_date, status, created_at)
             SELECT ?, ?, ?, ?, 'confirmed', ?
             WHERE NOT EXISTS (
                 SELECT 1 FROM bookings
                 WHERE spot_id = ? AND status != 'declined'
                   AND start_date <= ? AND end_date >= ?
             )
             RETURNING booking_id, user_id, spot_id, slot_id, start_date, end_date, status,
                       price, commission_amount, size_id, placement_id, is_color,
                       reference_url, comment, created_at",
        )
        .bind(user_id)
        .bind(spot_id)
        .bind(start_date)
        .bind(end_date)
        .bind(Utc::now())
        .bind(spot_id)
        .bind(end_date)
        .bind(start_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(booking) = booking else {
            return Err(ServiceError::Conflict(
                "This spot is already booked during the selected dates.".into(),
            ));
        };

        tx.commit().await?;
        debug!(
            "created range booking {} for spot {} ({} → {})",
            booking.booking_id, spot_id, start_date, end_date
        );
        Ok(booking)
    }

    /// Book a published appointment slot.
    ///
    /// - Requires slotId, sizeId, and placementId; color flag, reference URL,
    ///   and comment are optional detail.
    /// - The slot must exist, be unbooked, and start strictly in the future.
    /// - The booking insert and the `is_booked` flip share one transaction;
    ///   the flip is conditional on the flag still being clear, which
    ///   arbitrates concurrent attempts on the same slot.
    ///
    /// The booking starts `pending` with the spot id copied from the slot,
    /// occupying the calendar dates the appointment covers.
    pub async fn create_slot_booking(
        &self,
        user_id: i64,
        input: SlotBookingInput,
    ) -> ServiceResult<Booking> {
        let (Some(slot_id), Some(size_id), Some(placement_id)) =
            (input.slot_id, input.size_id, input.placement_id)
        else {
            return Err(ServiceError::Validation(
                "Missing required fields: slotId, sizeId, and placementId are needed.".into(),
            ));
        };

        let mut tx = self.db.begin().await?;

        let slot = sqlx::query_as::<_, Slot>(
            "SELECT slot_id, spot_id, starts_at, duration_minutes, is_booked
             FROM slots WHERE slot_id = ?",
        )
        .bind(slot_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Slot not found.".into()))?;

        if slot.is_booked {
            return Err(ServiceError::Conflict(
                "This slot has already been booked.".into(),
            ));
        }
        if slot.starts_at <= Utc::now() {
            return Err(ServiceError::Validation(
                "Slot must be in the future.".into(),
            ));
        }

        let start_date = slot.starts_at.date_naive();
        let end_date = (slot.starts_at + Duration::minutes(slot.duration_minutes)).date_naive();

        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (user_id, spot_id, slot_id, start_date, end_date, status,
                                   size_id, placement_id, is_color, reference_url, comment,
                                   created_at)
             VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?, ?)
             RETURNING booking_id, user_id, spot_id, slot_id, start_date, end_date, status,
                       price, commission_amount, size_id, placement_id, is_color,
                       reference_url, comment, created_at",
        )
        .bind(user_id)
        .bind(slot.spot_id)
        .bind(slot_id)
        .bind(start_date)
        .bind(end_date)
        .bind(size_id)
        .bind(placement_id)
        .bind(input.is_color)
        .bind(input.reference_url)
        .bind(input.comment)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        // Zero rows here means another transaction took the slot after our
        // read; rolling back discards the booking insert as well.
        let flipped =
            sqlx::query("UPDATE slots SET is_booked = 1 WHERE slot_id = ? AND is_booked = 0")
                .bind(slot_id)
                .execute(&mut *tx)
                .await?;
        if flipped.rows_affected() == 0 {
            return Err(ServiceError::Conflict(
                "This slot has already been booked.".into(),
            ));
        }

        tx.commit().await?;
        debug!(
            "created slot booking {} consuming slot {}",
            booking.booking_id, slot_id
        );
        Ok(booking)
    }

    /// Apply a lifecycle change to a booking.
    ///
    /// Dispatches on which party the caller is: the spot owner quotes a
    /// price, the booking's client confirms or declines. A caller who is
    /// both parties picks the quote branch by sending `price`. Anyone else
    /// is rejected before any state is touched.
    ///
    /// - Quote: requires a `pending` booking with no price yet; the price
    ///   must be a positive number. Stores the price, retains a 10%
    ///   commission amount, and moves to `quoted`.
    /// - Confirm/decline: requires a `quoted` booking. Declining releases
    ///   the consumed slot in the same transaction so it can be booked
    ///   again; the booking row itself is kept for history.
    ///
    /// Returns the updated booking.
    pub async fn update_booking(
        &self,
        user_id: i64,
        booking_id: i64,
        update: BookingUpdate,
    ) -> ServiceResult<Booking> {
        let mut tx = self.db.begin().await?;

        let parties = sqlx::query_as::<_, BookingParties>(
            "SELECT b.booking_id, b.user_id, b.slot_id, b.status, b.price,
                    s.user_id AS owner_id
             FROM bookings b
             JOIN spots s ON s.spot_id = b.spot_id
             WHERE b.booking_id = ?",
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Booking not found.".into()))?;

        let is_provider = user_id == parties.owner_id;
        let is_client = user_id == parties.user_id;
        if !is_provider && !is_client {
            return Err(ServiceError::Authorization(
                "You are not a party to this booking.".into(),
            ));
        }

        let quoting = if is_provider && is_client {
            update.price.is_some()
        } else {
            is_provider
        };

        let booking = if quoting {
            self.quote(&mut tx, &parties, update.price).await?
        } else {
            self.respond(&mut tx, &parties, update.action.as_deref())
                .await?
        };

        tx.commit().await?;
        Ok(booking)
    }

    /// Provider branch of the lifecycle: set the price and move to `quoted`.
    async fn quote(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        parties: &BookingParties,
        price: Option<f64>,
    ) -> ServiceResult<Booking> {
        if parties.price.is_some() {
            return Err(ServiceError::Validation(
                "Price has already been set.".into(),
            ));
        }
        if parties.status != BookingStatus::Pending {
            return Err(ServiceError::Validation(
                "Only pending bookings can be quoted.".into(),
            ));
        }
        let price = match price {
            Some(p) if p.is_finite() && p > 0.0 => p,
            _ => {
                return Err(ServiceError::Validation(
                    "Price must be a positive number.".into(),
                ));
            }
        };
        let commission = price * COMMISSION_RATE;

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'quoted', price = ?, commission_amount = ?
             WHERE booking_id = ?
             RETURNING booking_id, user_id, spot_id, slot_id, start_date, end_date, status,
                       price, commission_amount, size_id, placement_id, is_color,
                       reference_url, comment, created_at",
        )
        .bind(price)
        .bind(commission)
        .bind(parties.booking_id)
        .fetch_one(&mut **tx)
        .await?;

        debug!(
            "quoted booking {} at {} (commission {})",
            parties.booking_id, price, commission
        );
        Ok(booking)
    }

    /// Client branch of the lifecycle: confirm or decline a quoted booking.
    async fn respond(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        parties: &BookingParties,
        action: Option<&str>,
    ) -> ServiceResult<Booking> {
        let next = match action {
            Some("confirm") => BookingStatus::Confirmed,
            Some("decline") => BookingStatus::Declined,
            _ => {
                return Err(ServiceError::Validation(
                    "Invalid action. Use \"confirm\" or \"decline\".".into(),
                ));
            }
        };

        match parties.status {
            BookingStatus::Quoted => {}
            BookingStatus::Pending => {
                return Err(ServiceError::Validation(
                    "No price has been set for this booking.".into(),
                ));
            }
            BookingStatus::Confirmed | BookingStatus::Declined => {
                return Err(ServiceError::Validation(
                    "Booking has already been finalized.".into(),
                ));
            }
        }

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = ? WHERE booking_id = ?
             RETURNING booking_id, user_id, spot_id, slot_id, start_date, end_date, status,
                       price, commission_amount, size_id, placement_id, is_color,
                       reference_url, comment, created_at",
        )
        .bind(next)
        .bind(parties.booking_id)
        .fetch_one(&mut **tx)
        .await?;

        if next == BookingStatus::Declined {
            if let Some(slot_id) = parties.slot_id {
                sqlx::query("UPDATE slots SET is_booked = 0 WHERE slot_id = ?")
                    .bind(slot_id)
                    .execute(&mut **tx)
                    .await?;
                debug!(
                    "released slot {} after decline of booking {}",
                    slot_id, parties.booking_id
                );
            }
        }

        Ok(booking)
    }

    /// List the caller's bookings, newest start date first, each with a
    /// small summary of the booked spot.
    pub async fn my_bookings(&self, user_id: i64) -> ServiceResult<Vec<MyBooking>> {
        let rows = sqlx::query_as::<_, MyBookingRow>(
            "SELECT b.booking_id, b.start_date, b.end_date, b.status, b.price,
                    s.spot_id, c.name AS city_name
             FROM bookings b
             JOIN spots s ON s.spot_id = b.spot_id
             LEFT JOIN cities c ON c.city_id = s.city_id
             WHERE b.user_id = ?
             ORDER BY b.start_date DESC",
        )
        .bind(user_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MyBooking {
                booking_id: row.booking_id,
                start_date: row.start_date,
                end_date: row.end_date,
                status: row.status,
                price: row.price,
                spot: MyBookingSpot {
                    spot_id: row.spot_id,
                    city_name: row.city_name,
                },
            })
            .collect())
    }

    /// Publish an availability window for a spot.
    ///
    /// - Owner-gated; a missing spot is reported the same way as someone
    ///   else's spot.
    /// - `dateFrom` must be strictly before `dateTo`.
    pub async fn add_availability(
        &self,
        user_id: i64,
        spot_id: i64,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> ServiceResult<Availability> {
        self.require_spot_owner(user_id, spot_id, "Unauthorized or invalid spot.")
            .await?;

        let (Some(from_raw), Some(to_raw)) = (date_from, date_to) else {
            return Err(ServiceError::Validation(
                "Missing required fields: dateFrom and dateTo are needed.".into(),
            ));
        };
        let date_from = parse_date(from_raw)?;
        let date_to = parse_date(to_raw)?;
        if date_from >= date_to {
            return Err(ServiceError::Validation(
                "dateFrom must be before dateTo.".into(),
            ));
        }

        let availability = sqlx::query_as::<_, Availability>(
            "INSERT INTO availabilities (spot_id, date_from, date_to) VALUES (?, ?, ?)
             RETURNING availability_id, spot_id, date_from, date_to",
        )
        .bind(spot_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_one(&*self.db)
        .await?;

        Ok(availability)
    }

    /// List a spot's availability windows, earliest first.
    ///
    /// An unknown spot yields an empty list, not an error.
    pub async fn list_availabilities(&self, spot_id: i64) -> ServiceResult<Vec<Availability>> {
        let windows = sqlx::query_as::<_, Availability>(
            "SELECT availability_id, spot_id, date_from, date_to
             FROM availabilities
             WHERE spot_id = ?
             ORDER BY date_from ASC",
        )
        .bind(spot_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(windows)
    }

    /// Publish an appointment slot for a spot.
    ///
    /// Owner-gated like availability windows. The slot must start strictly
    /// in the future and run for a positive number of minutes.
    pub async fn add_slot(
        &self,
        user_id: i64,
        spot_id: i64,
        starts_at: Option<&str>,
        duration_minutes: Option<i64>,
    ) -> ServiceResult<Slot> {
        self.require_spot_owner(user_id, spot_id, "Unauthorized or invalid spot.")
            .await?;

        let (Some(starts_raw), Some(duration_minutes)) = (starts_at, duration_minutes) else {
            return Err(ServiceError::Validation(
                "Missing required fields: startsAt and durationMinutes are needed.".into(),
            ));
        };
        let starts_at = parse_datetime(starts_raw)?;
        if starts_at <= Utc::now() {
            return Err(ServiceError::Validation(
                "Slot must be in the future.".into(),
            ));
        }
        if duration_minutes <= 0 {
            return Err(ServiceError::Validation(
                "Duration must be a positive number of minutes.".into(),
            ));
        }

        let slot = sqlx::query_as::<_, Slot>(
            "INSERT INTO slots (spot_id, starts_at, duration_minutes, is_booked)
             VALUES (?, ?, ?, 0)
             RETURNING slot_id, spot_id, starts_at, duration_minutes, is_booked",
        )
        .bind(spot_id)
        .bind(starts_at)
        .bind(duration_minutes)
        .fetch_one(&*self.db)
        .await?;

        Ok(slot)
    }

    /// List a spot's upcoming slots, earliest first. Booked slots are
    /// included so clients can see what is already taken.
    pub async fn list_slots(&self, spot_id: i64) -> ServiceResult<Vec<Slot>> {
        let slots = sqlx::query_as::<_, Slot>(
            "SELECT slot_id, spot_id, starts_at, duration_minutes, is_booked
             FROM slots
             WHERE spot_id = ? AND starts_at > ?
             ORDER BY starts_at ASC",
        )
        .bind(spot_id)
        .bind(Utc::now())
        .fetch_all(&*self.db)
        .await?;

        Ok(slots)
    }

    /// Submit a review for a booking.
    ///
    /// - Rating must be 1 through 5.
    /// - Only the booking's client may review it; a missing booking gets the
    ///   same Authorization error, so nothing leaks about other people's
    ///   bookings.
    /// - One review per booking, enforced by the UNIQUE constraint and
    ///   reported as Conflict.
    pub async fn create_review(
        &self,
        user_id: i64,
        booking_id: Option<i64>,
        rating: Option<i64>,
        comment: Option<String>,
    ) -> ServiceResult<Review> {
        let Some(booking_id) = booking_id else {
            return Err(ServiceError::Validation(
                "Missing required field: bookingId.".into(),
            ));
        };
        let rating = match rating {
            Some(r) if (1..=5).contains(&r) => r,
            _ => {
                return Err(ServiceError::Validation(
                    "Rating must be between 1 and 5.".into(),
                ));
            }
        };

        let client_id =
            sqlx::query_scalar::<_, i64>("SELECT user_id FROM bookings WHERE booking_id = ?")
                .bind(booking_id)
                .fetch_optional(&*self.db)
                .await?;
        if client_id != Some(user_id) {
            return Err(ServiceError::Authorization(
                "Invalid booking or not your booking.".into(),
            ));
        }

        match sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (user_id, booking_id, rating, comment, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING review_id, user_id, booking_id, rating, comment, created_at",
        )
        .bind(user_id)
        .bind(booking_id)
        .bind(rating)
        .bind(comment)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
        {
            Ok(review) => Ok(review),
            Err(err) if is_unique_violation(&err) => Err(ServiceError::Conflict(
                "This booking has already been reviewed.".into(),
            )),
            Err(err) => Err(ServiceError::Sqlx(err)),
        }
    }

    /// Resolve a spot's owner and run the capability check, folding a
    /// missing spot into the same Authorization error the caller would get
    /// for someone else's spot.
    async fn require_spot_owner(
        &self,
        user_id: i64,
        spot_id: i64,
        denied: &str,
    ) -> ServiceResult<()> {
        let owner_id = sqlx::query_scalar::<_, i64>("SELECT user_id FROM spots WHERE spot_id = ?")
            .bind(spot_id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Authorization(denied.to_string()))?;

        ensure_owner(user_id, owner_id, denied)
    }
}
