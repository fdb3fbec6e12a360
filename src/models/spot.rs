//! Represents a bookable spot — the listing a provider offers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bookable listing owned by a single user.
///
/// A spot doubles as the provider's public profile: description, street
/// address, social links, and a cover image. Style tags live in the
/// `spot_styles` join table, published dates in `availabilities` and `slots`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    /// Primary key.
    pub spot_id: i64,

    /// Owning user.
    pub user_id: i64,

    /// Optional home city (catalog reference).
    pub city_id: Option<i64>,

    pub description: Option<String>,

    pub street_address: Option<String>,

    pub instagram_link: Option<String>,

    pub portfolio_link: Option<String>,

    /// Cover image URL.
    pub image_url: Option<String>,

    /// Membership fee paid at provider registration, if any.
    pub membership_fee: Option<f64>,

    /// When this listing was created.
    pub created_at: DateTime<Utc>,
}
