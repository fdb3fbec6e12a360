//! Shared application state handed to every handler.

use crate::auth::TokenKeys;
use crate::services::{
    account_service::AccountService, booking_service::BookingService, spot_service::SpotService,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Cloneable bundle of services plus the token keys.
///
/// The services all share one `Arc<SqlitePool>` internally, so cloning the
/// state per request is cheap. The pool itself is kept here too for the
/// readiness probe.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub accounts: AccountService,
    pub spots: SpotService,
    pub bookings: BookingService,
    pub tokens: TokenKeys,
}
