//! Service layer — business rules and storage access.
//!
//! Each service owns one slice of the domain and talks to the shared SQLite
//! pool. All of them speak the same `ServiceError` taxonomy, which the HTTP
//! layer maps onto status codes.

pub mod account_service;
pub mod booking_service;
pub mod spot_service;

use thiserror::Error;

/// Failure taxonomy shared by every service.
///
/// Variants map one-to-one onto HTTP statuses at the edge:
/// Validation → 400, Authorization → 403, NotFound → 404, Conflict → 409,
/// Sqlx/Internal → 500.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The single capability check behind every owner-gated mutation.
///
/// Compares the caller against the resource owner and turns a mismatch into
/// an Authorization error carrying the given denial message.
pub fn ensure_owner(user_id: i64, owner_id: i64, denied: &str) -> ServiceResult<()> {
    if user_id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::Authorization(denied.to_string()))
    }
}

/// Return true if a SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

/// Parse an ISO `YYYY-MM-DD` date out of client input.
pub(crate) fn parse_date(raw: &str) -> ServiceResult<chrono::NaiveDate> {
    raw.trim()
        .parse::<chrono::NaiveDate>()
        .map_err(|_| ServiceError::Validation("Invalid date format.".into()))
}

/// Parse an RFC 3339 timestamp out of client input.
pub(crate) fn parse_datetime(raw: &str) -> ServiceResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|_| ServiceError::Validation("Invalid date format.".into()))
}
