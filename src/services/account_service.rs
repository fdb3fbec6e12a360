//! src/services/account_service.rs
//!
//! AccountService — registration, login verification, and the /users/me
//! profile surface. Artist registration is payment-gated: the checkout
//! session is retrieved through the `CheckoutGateway` trait and its
//! metadata supplies the registration form, so an account only comes into
//! existence once the gateway reports the session as paid.

use crate::models::{booking::BookingStatus, user::User};
use crate::payments::{CheckoutError, CheckoutGateway};
use crate::services::{
    ServiceError, ServiceResult, is_unique_violation, parse_date, spot_service::link_styles,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::debug;

/// Fields accepted by plain user registration.
#[derive(Debug, Default)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<String>,
    pub role: Option<String>,
}

/// Fields accepted by the profile update. Absent fields are left untouched;
/// a new password is re-hashed before it is stored.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<String>,
}

/// The caller's profile with their booking history attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub bookings: Vec<ProfileBooking>,
}

/// One booking in the profile view, with its spot and review (if any).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBooking {
    pub booking_id: i64,
    pub created_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub spot: ProfileSpot,
    pub review: Option<ProfileReview>,
}

/// Spot block nested under a profile booking.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSpot {
    pub spot_id: i64,
    pub description: Option<String>,
    pub street_address: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
}

/// Review block nested under a profile booking.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReview {
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Scalar profile fields, as returned after a profile update.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// The outcome of a paid artist registration.
#[derive(Debug)]
pub struct ArtistRegistration {
    pub user: User,
    pub spot_id: i64,
}

#[derive(FromRow)]
struct ProfileBookingRow {
    booking_id: i64,
    created_at: DateTime<Utc>,
    status: BookingStatus,
    spot_id: i64,
    description: Option<String>,
    street_address: Option<String>,
    image_url: Option<String>,
    rating: Option<i64>,
    comment: Option<String>,
    review_created_at: Option<DateTime<Utc>>,
}

/// Every artist pays the same membership fee at signup; the paid amount is
/// recorded on their spot row.
const ARTIST_MEMBERSHIP_FEE: f64 = 49.99;

/// AccountService owns the user table:
/// - `register_user` / `register_artist` create accounts (the latter only
///   after the checkout gateway confirms payment).
/// - `verify_login` checks credentials without leaking which part failed.
/// - `me` / `update_me` / `delete_me` serve the authenticated profile.
#[derive(Clone)]
pub struct AccountService {
    /// Shared SQLite connection pool.
    db: Arc<SqlitePool>,
    /// Payment provider used to verify artist registrations.
    checkout: Arc<dyn CheckoutGateway>,
}

impl AccountService {
    /// Create a new AccountService backed by the pool and a checkout gateway.
    pub fn new(db: Arc<SqlitePool>, checkout: Arc<dyn CheckoutGateway>) -> Self {
        Self { db, checkout }
    }

    /// Register a plain user account.
    ///
    /// - Validation when email, password, firstName, or lastName is missing.
    /// - Conflict ("Email already in use.") on a duplicate email; the UNIQUE
    ///   index is the only check, so concurrent registrations cannot race.
    /// - The password is stored as a bcrypt hash; `role` defaults to "user".
    pub async fn register_user(&self, input: RegisterInput) -> ServiceResult<User> {
        let (Some(email), Some(password), Some(first_name), Some(last_name)) = (
            input.email.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            input.password.as_deref().filter(|s| !s.is_empty()),
            input
                .first_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty()),
            input
                .last_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        ) else {
            return Err(ServiceError::Validation(
                "Missing required fields: email, password, firstName, and lastName are needed."
                    .into(),
            ));
        };

        let birth_date = match input.birth_date.as_deref() {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        };
        let hash = hash_password(password)?;
        let role = input.role.as_deref().unwrap_or("user");

        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password, first_name, last_name, phone_number,
                                birth_date, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING user_id, email, password, first_name, last_name, phone_number,
                       birth_date, role, created_at",
        )
        .bind(email)
        .bind(&hash)
        .bind(first_name)
        .bind(last_name)
        .bind(&input.phone_number)
        .bind(birth_date)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match inserted {
            Ok(user) => {
                debug!("registered user {} with role {}", user.user_id, user.role);
                Ok(user)
            }
            Err(err) if is_unique_violation(&err) => {
                Err(ServiceError::Conflict("Email already in use.".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Register an artist from a paid checkout session.
    ///
    /// - Validation when the session id is blank, the session is unknown, or
    ///   its metadata lacks the email, password, or name fields.
    /// - Authorization ("Payment not completed.") unless the gateway reports
    ///   the session as paid.
    /// - The session metadata carries the registration form (the password
    ///   arrives already hashed by the checkout flow); user, spot, and style
    ///   links are written in one transaction.
    pub async fn register_artist(&self, session_id: &str) -> ServiceResult<ArtistRegistration> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(ServiceError::Validation("Missing session ID.".into()));
        }

        let session = self
            .checkout
            .fetch_session(session_id)
            .await
            .map_err(|err| match err {
                CheckoutError::SessionNotFound(_) => {
                    ServiceError::Validation("Unknown checkout session.".into())
                }
                CheckoutError::Gateway(detail) => ServiceError::Internal(detail),
            })?;

        if !session.is_paid() {
            return Err(ServiceError::Authorization("Payment not completed.".into()));
        }

        let meta = &session.metadata;
        let (Some(email), Some(password_hash), Some(first_name), Some(last_name)) = (
            meta.get("email").map(|s| s.trim()).filter(|s| !s.is_empty()),
            meta.get("password").filter(|s| !s.is_empty()),
            meta.get("firstName")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty()),
            meta.get("lastName")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty()),
        ) else {
            return Err(ServiceError::Validation(
                "Checkout session is missing registration details.".into(),
            ));
        };

        let birth_date = match meta.get("birthDate") {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        };
        let city_id = match meta.get("cityId") {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
                ServiceError::Validation("Invalid city ID in checkout session.".into())
            })?),
            None => None,
        };
        let style_ids = parse_style_ids(meta.get("styleIds").map(String::as_str))?;

        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password, first_name, last_name, phone_number,
                                birth_date, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 'artist', ?)
             RETURNING user_id, email, password, first_name, last_name, phone_number,
                       birth_date, role, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(meta.get("phoneNumber").map(String::as_str))
        .bind(birth_date)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await;

        let user = match inserted {
            Ok(user) => user,
            Err(err) if is_unique_violation(&err) => {
                return Err(ServiceError::Conflict("Email already in use.".into()));
            }
            Err(err) => return Err(err.into()),
        };

        let spot_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO spots (user_id, city_id, description, street_address, instagram_link,
                                portfolio_link, image_url, membership_fee, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING spot_id",
        )
        .bind(user.user_id)
        .bind(city_id)
        .bind(meta.get("description").map(String::as_str))
        .bind(meta.get("streetAddress").map(String::as_str))
        .bind(meta.get("instagramLink").map(String::as_str))
        .bind(meta.get("portfolioLink").map(String::as_str))
        .bind(meta.get("imageURL").map(String::as_str))
        .bind(ARTIST_MEMBERSHIP_FEE)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        link_styles(&mut tx, spot_id, &style_ids).await?;

        tx.commit().await?;
        debug!("registered artist {} with spot {}", user.user_id, spot_id);
        Ok(ArtistRegistration { user, spot_id })
    }

    /// Check a login attempt. Returns the user on a match and `None` when
    /// the email is unknown or the password is wrong, so the caller can
    /// answer both cases identically.
    pub async fn verify_login(&self, email: &str, password: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, email, password, first_name, last_name, phone_number,
                    birth_date, role, created_at
             FROM users
             WHERE email = ?",
        )
        .bind(email.trim())
        .fetch_optional(&*self.db)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let matches = bcrypt::verify(password, &user.password)
            .map_err(|err| ServiceError::Internal(format!("Password check failed: {err}")))?;

        Ok(matches.then_some(user))
    }

    /// Fetch the caller's profile with their bookings, each carrying its
    /// spot and review (if one was left).
    pub async fn me(&self, user_id: i64) -> ServiceResult<Profile> {
        let fields = sqlx::query_as::<_, ProfileFields>(
            "SELECT user_id, email, first_name, last_name, phone_number, birth_date
             FROM users
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))?;

        let rows = sqlx::query_as::<_, ProfileBookingRow>(
            "SELECT b.booking_id, b.created_at, b.status,
                    s.spot_id, s.description, s.street_address, s.image_url,
                    r.rating, r.comment, r.created_at AS review_created_at
             FROM bookings b
             JOIN spots s ON s.spot_id = b.spot_id
             LEFT JOIN reviews r ON r.booking_id = b.booking_id
             WHERE b.user_id = ?
             ORDER BY b.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&*self.db)
        .await?;

        let bookings = rows
            .into_iter()
            .map(|row| {
                let review = match (row.rating, row.review_created_at) {
                    (Some(rating), Some(created_at)) => Some(ProfileReview {
                        rating,
                        comment: row.comment,
                        created_at,
                    }),
                    _ => None,
                };
                ProfileBooking {
                    booking_id: row.booking_id,
                    created_at: row.created_at,
                    status: row.status,
                    spot: ProfileSpot {
                        spot_id: row.spot_id,
                        description: row.description,
                        street_address: row.street_address,
                        image_url: row.image_url,
                    },
                    review,
                }
            })
            .collect();

        Ok(Profile {
            user_id: fields.user_id,
            email: fields.email,
            first_name: fields.first_name,
            last_name: fields.last_name,
            phone_number: fields.phone_number,
            birth_date: fields.birth_date,
            bookings,
        })
    }

    /// Update the caller's profile. Only provided fields are touched; a new
    /// password is bcrypt-hashed, a new email must still be unique.
    pub async fn update_me(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> ServiceResult<ProfileFields> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut fields = builder.separated(", ");
        let mut dirty = false;
        if let Some(email) = update.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            fields.push("email = ").push_bind_unseparated(email.to_owned());
            dirty = true;
        }
        if let Some(first_name) = &update.first_name {
            fields.push("first_name = ").push_bind_unseparated(first_name);
            dirty = true;
        }
        if let Some(last_name) = &update.last_name {
            fields.push("last_name = ").push_bind_unseparated(last_name);
            dirty = true;
        }
        if let Some(phone_number) = &update.phone_number {
            fields
                .push("phone_number = ")
                .push_bind_unseparated(phone_number);
            dirty = true;
        }
        if let Some(raw) = update.birth_date.as_deref() {
            let birth_date = parse_date(raw)?;
            fields
                .push("birth_date = ")
                .push_bind_unseparated(birth_date);
            dirty = true;
        }
        if let Some(password) = update.password.as_deref().filter(|s| !s.is_empty()) {
            let hash = hash_password(password)?;
            fields.push("password = ").push_bind_unseparated(hash);
            dirty = true;
        }

        if dirty {
            builder.push(" WHERE user_id = ");
            builder.push_bind(user_id);
            let result = builder.build().execute(&*self.db).await;
            match result {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    return Err(ServiceError::Conflict("Email already in use.".into()));
                }
                Err(err) => return Err(err.into()),
            }
        }

        sqlx::query_as::<_, ProfileFields>(
            "SELECT user_id, email, first_name, last_name, phone_number, birth_date
             FROM users
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))
    }

    /// Delete the caller's account and everything hanging off it.
    ///
    /// One transaction: release slots held by the caller's bookings, delete
    /// reviews (their own and those on their spots' bookings), delete
    /// bookings (their own and those on their spots), delete their spots
    /// (style links, availabilities, and slots cascade), then the user row.
    pub async fn delete_me(&self, user_id: i64) -> ServiceResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "UPDATE slots SET is_booked = 0
             WHERE slot_id IN (SELECT slot_id FROM bookings
                               WHERE user_id = ? AND slot_id IS NOT NULL)",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM reviews
             WHERE user_id = ?
                OR booking_id IN (SELECT booking_id FROM bookings
                                  WHERE spot_id IN (SELECT spot_id FROM spots WHERE user_id = ?))",
        )
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM bookings
             WHERE user_id = ?
                OR spot_id IN (SELECT spot_id FROM spots WHERE user_id = ?)",
        )
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM spots WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::NotFound("User not found".into()));
        }

        tx.commit().await?;
        debug!("deleted user {} and related data", user_id);
        Ok(())
    }
}

/// Hash a password for storage.
fn hash_password(password: &str) -> ServiceResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|err| ServiceError::Internal(format!("Password hashing failed: {err}")))
}

/// Parse the comma-separated style id list carried in checkout metadata.
fn parse_style_ids(raw: Option<&str>) -> ServiceResult<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = part.parse::<i64>().map_err(|_| {
            ServiceError::Validation("Invalid style IDs in checkout session.".into())
        })?;
        ids.push(id);
    }
    Ok(ids)
}
