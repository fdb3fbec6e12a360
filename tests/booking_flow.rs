//! End-to-end tests for the booking engine: range-overlap admission, slot
//! consumption, and the quote → confirm/decline lifecycle.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    add_slot, book_range, book_slot, insert_slot_raw, register_and_login, register_provider,
    test_server,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

#[sqlx::test(migrations = "./migrations")]
async fn range_bookings_conflict_on_overlap(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (_provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;
    let rival = register_and_login(&server, "rival@example.com").await;

    book_range(&server, &client, spot_id, "2031-05-10", "2031-05-14").await;

    // A shared boundary day still counts as overlap: the interval is closed.
    let overlapping = server
        .post("/bookings")
        .authorization_bearer(&rival)
        .json(&json!({ "spotId": spot_id, "startDate": "2031-05-14", "endDate": "2031-05-20" }))
        .await;
    overlapping.assert_status(StatusCode::CONFLICT);
    let conflict: Value = overlapping.json();
    assert_eq!(conflict["success"], false);
    assert_eq!(
        conflict["message"],
        "This spot is already booked during the selected dates."
    );

    // The day after the booked window is free again.
    book_range(&server, &rival, spot_id, "2031-05-15", "2031-05-20").await;
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn range_booking_rejects_bad_input(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (_provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;

    let missing = server
        .post("/bookings")
        .authorization_bearer(&client)
        .json(&json!({ "spotId": spot_id, "startDate": "2031-05-10" }))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.json::<Value>()["message"],
        "Missing required fields: spotId, startDate, and endDate are needed."
    );

    let garbled = server
        .post("/bookings")
        .authorization_bearer(&client)
        .json(&json!({ "spotId": spot_id, "startDate": "soonish", "endDate": "2031-05-20" }))
        .await;
    garbled.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(garbled.json::<Value>()["message"], "Invalid date format.");

    let inverted = server
        .post("/bookings")
        .authorization_bearer(&client)
        .json(&json!({ "spotId": spot_id, "startDate": "2031-05-20", "endDate": "2031-05-10" }))
        .await;
    inverted.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        inverted.json::<Value>()["message"],
        "Start date must be before end date."
    );

    let unknown = server
        .post("/bookings")
        .authorization_bearer(&client)
        .json(&json!({ "spotId": 9999, "startDate": "2031-05-10", "endDate": "2031-05-12" }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(unknown.json::<Value>()["message"], "Spot not found");

    // A single-day stay (start == end) is allowed.
    book_range(&server, &client, spot_id, "2031-06-01", "2031-06-01").await;
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn booking_requires_a_token(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);

    let response = server
        .post("/bookings")
        .json(&json!({ "spotId": 1, "startDate": "2031-05-10", "endDate": "2031-05-12" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["message"],
        "Missing authorization header."
    );

    let garbage = server
        .post("/bookings")
        .authorization_bearer("not-a-real-token")
        .json(&json!({ "spotId": 1, "startDate": "2031-05-10", "endDate": "2031-05-12" }))
        .await;
    garbage.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        garbage.json::<Value>()["message"],
        "Invalid or expired token."
    );
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn slot_booking_consumes_the_slot(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;
    let rival = register_and_login(&server, "rival@example.com").await;
    let slot_id = add_slot(&server, &provider, spot_id, 48).await;

    book_slot(&server, &client, slot_id).await;

    // The published slot now shows as booked.
    let slots: Value = server.get(&format!("/slots/{spot_id}")).await.json();
    assert_eq!(slots["slots"][0]["isBooked"], true);

    let second = server
        .post("/bookings")
        .authorization_bearer(&rival)
        .json(&json!({ "slotId": slot_id, "sizeId": 1, "placementId": 1 }))
        .await;
    second.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        second.json::<Value>()["message"],
        "This slot has already been booked."
    );
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn slot_booking_rejects_missing_past_and_unknown_slots(
    pool: SqlitePool,
) -> sqlx::Result<()> {
    let server = test_server(pool.clone());
    let (_provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;

    let incomplete = server
        .post("/bookings")
        .authorization_bearer(&client)
        .json(&json!({ "slotId": 1, "sizeId": 2 }))
        .await;
    incomplete.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        incomplete.json::<Value>()["message"],
        "Missing required fields: slotId, sizeId, and placementId are needed."
    );

    let unknown = server
        .post("/bookings")
        .authorization_bearer(&client)
        .json(&json!({ "slotId": 404, "sizeId": 2, "placementId": 3 }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(unknown.json::<Value>()["message"], "Slot not found.");

    // A slot whose start already passed can no longer be booked.
    let stale_id = insert_slot_raw(&pool, spot_id, Utc::now() - Duration::hours(3)).await;
    let stale = server
        .post("/bookings")
        .authorization_bearer(&client)
        .json(&json!({ "slotId": stale_id, "sizeId": 2, "placementId": 3 }))
        .await;
    stale.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        stale.json::<Value>()["message"],
        "Slot must be in the future."
    );
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn quote_then_decline_releases_the_slot(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;
    let slot_id = add_slot(&server, &provider, spot_id, 72).await;
    let booking_id = book_slot(&server, &client, slot_id).await;

    // The client cannot respond before a quote exists.
    let early = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&client)
        .json(&json!({ "action": "confirm" }))
        .await;
    early.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        early.json::<Value>()["message"],
        "No price has been set for this booking."
    );

    // An outsider is not a party to the booking at all.
    let outsider = register_and_login(&server, "outsider@example.com").await;
    let foreign = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&outsider)
        .json(&json!({ "price": 80.0 }))
        .await;
    foreign.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        foreign.json::<Value>()["message"],
        "You are not a party to this booking."
    );

    // Quotes must carry a positive price.
    let zero = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "price": 0.0 }))
        .await;
    zero.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        zero.json::<Value>()["message"],
        "Price must be a positive number."
    );

    // The provider quotes; the platform keeps 10%.
    let quoted = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "price": 120.0 }))
        .await;
    quoted.assert_status_ok();
    let body: Value = quoted.json();
    assert_eq!(body["booking"]["status"], "quoted");
    assert_eq!(body["booking"]["price"], 120.0);
    assert_eq!(body["booking"]["commissionAmount"], 12.0);

    // The price can be set at most once.
    let again = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "price": 90.0 }))
        .await;
    again.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        again.json::<Value>()["message"],
        "Price has already been set."
    );

    // The client declines and the slot frees up again.
    let declined = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&client)
        .json(&json!({ "action": "decline" }))
        .await;
    declined.assert_status_ok();
    assert_eq!(declined.json::<Value>()["booking"]["status"], "declined");

    let slots: Value = server.get(&format!("/slots/{spot_id}")).await.json();
    assert_eq!(slots["slots"][0]["isBooked"], false);

    // Terminal bookings stay put.
    let late = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&client)
        .json(&json!({ "action": "confirm" }))
        .await;
    late.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        late.json::<Value>()["message"],
        "Booking has already been finalized."
    );
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn confirm_keeps_the_slot_and_finishes_the_lifecycle(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;
    let slot_id = add_slot(&server, &provider, spot_id, 72).await;
    let booking_id = book_slot(&server, &client, slot_id).await;

    server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "price": 60.0 }))
        .await
        .assert_status_ok();

    // Gibberish actions are refused while the booking is quoted.
    let odd = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&client)
        .json(&json!({ "action": "maybe" }))
        .await;
    odd.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        odd.json::<Value>()["message"],
        "Invalid action. Use \"confirm\" or \"decline\"."
    );

    let confirmed = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&client)
        .json(&json!({ "action": "confirm" }))
        .await;
    confirmed.assert_status_ok();
    assert_eq!(confirmed.json::<Value>()["booking"]["status"], "confirmed");

    // The slot stays consumed after a confirmation.
    let slots: Value = server.get(&format!("/slots/{spot_id}")).await.json();
    assert_eq!(slots["slots"][0]["isBooked"], true);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn owner_booking_their_own_slot_can_still_quote(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let slot_id = add_slot(&server, &provider, spot_id, 24).await;
    let booking_id = book_slot(&server, &provider, slot_id).await;

    // Provider and client are the same account here; a request carrying a
    // price is treated as the quote side.
    let quoted = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "price": 45.0 }))
        .await;
    quoted.assert_status_ok();
    assert_eq!(quoted.json::<Value>()["booking"]["status"], "quoted");

    // Without a price the same account acts as the client.
    let confirmed = server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "action": "confirm" }))
        .await;
    confirmed.assert_status_ok();
    assert_eq!(confirmed.json::<Value>()["booking"]["status"], "confirmed");
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn declined_ranges_stop_blocking_the_calendar(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool.clone());
    let (provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;
    let rival = register_and_login(&server, "rival@example.com").await;
    let slot_id = add_slot(&server, &provider, spot_id, 48).await;

    // Decline a slot booking, then check its calendar days are bookable as
    // a range again: declined rows are invisible to the overlap check.
    let booking_id = book_slot(&server, &client, slot_id).await;
    server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "price": 100.0 }))
        .await
        .assert_status_ok();
    server
        .patch(&format!("/bookings/{booking_id}"))
        .authorization_bearer(&client)
        .json(&json!({ "action": "decline" }))
        .await
        .assert_status_ok();

    let slot_day = (Utc::now() + chrono::Duration::hours(48))
        .date_naive()
        .to_string();
    let reclaimed = server
        .post("/bookings")
        .authorization_bearer(&rival)
        .json(&json!({ "spotId": spot_id, "startDate": slot_day, "endDate": slot_day }))
        .await;
    reclaimed.assert_status(StatusCode::CREATED);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn my_bookings_lists_newest_start_first(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (_provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;

    book_range(&server, &client, spot_id, "2031-03-01", "2031-03-04").await;
    book_range(&server, &client, spot_id, "2031-07-01", "2031-07-04").await;

    let response = server
        .get("/bookings/my")
        .authorization_bearer(&client)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0]["startDate"], "2031-07-01");
    assert_eq!(bookings[1]["startDate"], "2031-03-01");
    assert_eq!(bookings[0]["spot"]["spotId"].as_i64().unwrap(), spot_id);
    assert_eq!(bookings[0]["spot"]["cityName"], "Amsterdam");
    assert_eq!(bookings[0]["status"], "confirmed");
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn reviews_are_client_only_and_unique_per_booking(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (_provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let client = register_and_login(&server, "client@example.com").await;
    let stranger = register_and_login(&server, "stranger@example.com").await;
    let booking_id = book_range(&server, &client, spot_id, "2031-05-10", "2031-05-12").await;

    let out_of_range = server
        .post("/reviews")
        .authorization_bearer(&client)
        .json(&json!({ "bookingId": booking_id, "rating": 6 }))
        .await;
    out_of_range.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        out_of_range.json::<Value>()["message"],
        "Rating must be between 1 and 5."
    );

    // Someone else's booking looks exactly like a missing one.
    let foreign = server
        .post("/reviews")
        .authorization_bearer(&stranger)
        .json(&json!({ "bookingId": booking_id, "rating": 4 }))
        .await;
    foreign.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        foreign.json::<Value>()["message"],
        "Invalid booking or not your booking."
    );

    let created = server
        .post("/reviews")
        .authorization_bearer(&client)
        .json(&json!({ "bookingId": booking_id, "rating": 5, "comment": "Great session" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["review"]["rating"], 5);
    assert_eq!(body["review"]["comment"], "Great session");

    let duplicate = server
        .post("/reviews")
        .authorization_bearer(&client)
        .json(&json!({ "bookingId": booking_id, "rating": 2 }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        duplicate.json::<Value>()["message"],
        "This booking has already been reviewed."
    );
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn availability_windows_are_owner_gated(pool: SqlitePool) -> sqlx::Result<()> {
    let server = test_server(pool);
    let (provider, spot_id) = register_provider(&server, "artist@example.com").await;
    let intruder = register_and_login(&server, "intruder@example.com").await;

    let denied = server
        .post(&format!("/availabilities/{spot_id}"))
        .authorization_bearer(&intruder)
        .json(&json!({ "dateFrom": "2031-05-01", "dateTo": "2031-05-31" }))
        .await;
    denied.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        denied.json::<Value>()["message"],
        "Unauthorized or invalid spot."
    );

    // A missing spot is reported exactly the same way.
    let phantom = server
        .post("/availabilities/9999")
        .authorization_bearer(&provider)
        .json(&json!({ "dateFrom": "2031-05-01", "dateTo": "2031-05-31" }))
        .await;
    phantom.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        phantom.json::<Value>()["message"],
        "Unauthorized or invalid spot."
    );

    let inverted = server
        .post(&format!("/availabilities/{spot_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "dateFrom": "2031-05-31", "dateTo": "2031-05-01" }))
        .await;
    inverted.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        inverted.json::<Value>()["message"],
        "dateFrom must be before dateTo."
    );

    server
        .post(&format!("/availabilities/{spot_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "dateFrom": "2031-06-01", "dateTo": "2031-06-30" }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post(&format!("/availabilities/{spot_id}"))
        .authorization_bearer(&provider)
        .json(&json!({ "dateFrom": "2031-05-01", "dateTo": "2031-05-31" }))
        .await
        .assert_status(StatusCode::CREATED);

    // Listing is public and ordered by start date.
    let listed: Value = server
        .get(&format!("/availabilities/{spot_id}"))
        .await
        .json();
    let windows = listed["availabilities"].as_array().unwrap();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0]["dateFrom"], "2031-05-01");
    assert_eq!(windows[1]["dateFrom"], "2031-06-01");
    Ok(())
}
