//! Represents a registered account — a client or a provider ("artist").

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user account.
///
/// Clients book spots; artists additionally own one or more spots. The role
/// string distinguishes them, everything else lives in the same table.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    pub user_id: i64,

    /// Login identifier, unique across all accounts.
    pub email: String,

    /// bcrypt hash of the password. Never serialized.
    #[serde(skip_serializing)]
    pub password: String,

    pub first_name: String,

    pub last_name: String,

    /// Optional contact number.
    pub phone_number: Option<String>,

    /// Optional date of birth.
    pub birth_date: Option<NaiveDate>,

    /// Either "user" or "artist".
    pub role: String,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
