//! Shared helpers for the HTTP integration tests: spin up the router on an
//! `axum_test::TestServer` around the per-test pool, and register the users
//! and fixtures most scenarios need.
#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use spotbook::build_state;
use spotbook::payments::{CheckoutGateway, MockCheckout};
use spotbook::routes::routes::routes;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Spin up the full router on a test server around the given pool.
pub fn test_server(pool: SqlitePool) -> TestServer {
    let (server, _mock) = test_server_with_checkout(pool);
    server
}

/// Like `test_server`, but also returns the mock checkout gateway so a test
/// can stage paid or unpaid sessions for artist registration.
pub fn test_server_with_checkout(pool: SqlitePool) -> (TestServer, Arc<MockCheckout>) {
    let mock = Arc::new(MockCheckout::new());
    let checkout: Arc<dyn CheckoutGateway> = mock.clone();
    let state = build_state(Arc::new(pool), checkout, TEST_JWT_SECRET);
    let server = TestServer::new(routes().with_state(state)).unwrap();
    (server, mock)
}

/// Register a user through the API and return their bearer token.
pub async fn register_and_login(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/register/user")
        .json(&json!({
            "email": email,
            "password": "hunter2!",
            "firstName": "Test",
            "lastName": "User",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Register a provider: a user plus a spot they own, linked to two styles.
/// Returns (token, spot_id).
pub async fn register_provider(server: &TestServer, email: &str) -> (String, i64) {
    let token = register_and_login(server, email).await;
    let response = server
        .post("/api/spots")
        .authorization_bearer(&token)
        .json(&json!({
            "cityId": 1,
            "description": "Walk-ins welcome",
            "streetAddress": "Main Street 1",
            "styleIds": [1, 2],
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let spot_id = response.json::<Value>()["spotId"].as_i64().unwrap();
    (token, spot_id)
}

/// Publish a slot through the API, starting `starts_in_hours` from now.
/// Returns the slot id.
pub async fn add_slot(server: &TestServer, token: &str, spot_id: i64, starts_in_hours: i64) -> i64 {
    let starts_at = (Utc::now() + Duration::hours(starts_in_hours)).to_rfc3339();
    let response = server
        .post(&format!("/slots/{spot_id}"))
        .authorization_bearer(token)
        .json(&json!({ "startsAt": starts_at, "durationMinutes": 90 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["slot"]["slotId"].as_i64().unwrap()
}

/// Insert a slot row directly, bypassing the publish endpoint's future-only
/// rule. Used to stage slots that have since passed.
pub async fn insert_slot_raw(
    pool: &SqlitePool,
    spot_id: i64,
    starts_at: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO slots (spot_id, starts_at, duration_minutes, is_booked)
         VALUES (?, ?, 60, 0)
         RETURNING slot_id",
    )
    .bind(spot_id)
    .bind(starts_at)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Book a slot through the API and return the booking id.
pub async fn book_slot(server: &TestServer, token: &str, slot_id: i64) -> i64 {
    let response = server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&json!({ "slotId": slot_id, "sizeId": 2, "placementId": 3, "isColor": true }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["bookingId"].as_i64().unwrap()
}

/// Book a date range through the API and return the booking id.
pub async fn book_range(
    server: &TestServer,
    token: &str,
    spot_id: i64,
    start: &str,
    end: &str,
) -> i64 {
    let response = server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&json!({ "spotId": spot_id, "startDate": start, "endDate": end }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["bookingId"].as_i64().unwrap()
}
