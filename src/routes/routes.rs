//! Defines routes for the whole booking API.
//!
//! ## Structure
//! - **Accounts**
//!   - `POST   /api/register/user` — register a client
//!   - `POST   /api/register/artist` — payment-gated artist registration
//!   - `POST   /login` — issue a token
//!   - `GET    /users/me` / `PATCH /users/me` / `DELETE /users/me`
//!
//! - **Spots and catalogs**
//!   - `GET    /api/spots` — filtered, paginated listing
//!   - `POST   /api/spots` — create a listing
//!   - `GET    /api/spots/{id}` / `PATCH /api/spots/{id}`
//!   - `GET    /cities`, `GET /styles`
//!
//! - **Bookings**
//!   - `POST   /bookings` — range or slot booking
//!   - `GET    /bookings/my`
//!   - `PATCH  /bookings/{id}` — quote / confirm / decline
//!   - `POST   /availabilities/{spot_id}` / `GET /availabilities/{spot_id}`
//!   - `POST   /slots/{spot_id}` / `GET /slots/{spot_id}`
//!   - `POST   /reviews`
//!
//! The `/api` prefix is kept only where the original clients expect it
//! (registration and spots); everything else mounts at the root.

use crate::{
    handlers::{
        account_handlers::{delete_me, login, me, register_artist, register_user, update_me},
        booking_handlers::{
            add_availability, add_slot, create_booking, create_review, list_availabilities,
            list_slots, my_bookings, update_booking,
        },
        health_handlers::{healthz, readyz},
        spot_handlers::{create_spot, get_spot, list_cities, list_spots, list_styles, update_spot},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Build and return the router for the whole API.
///
/// The router carries shared state (`AppState`) to all handlers; auth is
/// enforced per-handler through the `AuthUser` extractor rather than by
/// route-level middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // accounts
        .route("/api/register/user", post(register_user))
        .route("/api/register/artist", post(register_artist))
        .route("/login", post(login))
        .route("/users/me", get(me).patch(update_me).delete(delete_me))
        // spots and catalogs
        .route("/api/spots", get(list_spots).post(create_spot))
        .route("/api/spots/{id}", get(get_spot).patch(update_spot))
        .route("/cities", get(list_cities))
        .route("/styles", get(list_styles))
        // bookings
        .route("/bookings", post(create_booking))
        .route("/bookings/my", get(my_bookings))
        .route("/bookings/{id}", patch(update_booking))
        .route(
            "/availabilities/{spot_id}",
            get(list_availabilities).post(add_availability),
        )
        .route("/slots/{spot_id}", get(list_slots).post(add_slot))
        .route("/reviews", post(create_review))
}
