//! spotbook — REST backend for a marketplace where clients book independent
//! providers ("artists") by date range or by published appointment slot.
//!
//! The interesting part is the booking engine: range requests are admitted
//! by an overlap check folded into the insert statement, slot requests by a
//! conditional flip of the slot's booked flag, so concurrent requests for
//! the same spot or slot serialize in the database. On top of that sits a
//! quote → confirm/decline lifecycle with a platform commission.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;

use crate::auth::TokenKeys;
use crate::payments::CheckoutGateway;
use crate::services::{
    account_service::AccountService, booking_service::BookingService, spot_service::SpotService,
};
use crate::state::AppState;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Wire the service stack around a connected pool.
///
/// Used by the binary and by the integration tests, which supply a mock
/// checkout gateway and their own pool.
pub fn build_state(
    db: Arc<SqlitePool>,
    checkout: Arc<dyn CheckoutGateway>,
    jwt_secret: &str,
) -> AppState {
    AppState {
        db: db.clone(),
        accounts: AccountService::new(db.clone(), checkout),
        spots: SpotService::new(db.clone()),
        bookings: BookingService::new(db),
        tokens: TokenKeys::new(jwt_secret),
    }
}
