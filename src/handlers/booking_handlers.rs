//! HTTP handlers for bookings, availability windows, slots, and reviews.
//! One JSON body serves both booking shapes: a request carrying `slotId`
//! books an appointment slot, anything else is a date-range reservation.

use crate::{
    auth::AuthUser,
    errors::AppError,
    services::booking_service::{BookingUpdate, RangeBookingInput, SlotBookingInput},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

/// Request body for `POST /bookings`, covering both booking shapes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingReq {
    pub spot_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub slot_id: Option<i64>,
    pub size_id: Option<i64>,
    pub placement_id: Option<i64>,
    pub is_color: Option<bool>,
    #[serde(rename = "referenceURL")]
    pub reference_url: Option<String>,
    pub comment: Option<String>,
}

/// Request body for `PATCH /bookings/{id}` — `price` from the provider,
/// `action` ("confirm" or "decline") from the client.
#[derive(Debug, Deserialize)]
pub struct UpdateBookingReq {
    pub price: Option<f64>,
    pub action: Option<String>,
}

/// Request body for `POST /availabilities/{spot_id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAvailabilityReq {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Request body for `POST /slots/{spot_id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSlotReq {
    pub starts_at: Option<String>,
    pub duration_minutes: Option<i64>,
}

/// Request body for `POST /reviews`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewReq {
    pub booking_id: Option<i64>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

/// `POST /bookings` — create a booking through either admission path.
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateBookingReq>,
) -> Result<impl IntoResponse, AppError> {
    let booking = if body.slot_id.is_some() {
        state
            .bookings
            .create_slot_booking(
                user.user_id,
                SlotBookingInput {
                    slot_id: body.slot_id,
                    size_id: body.size_id,
                    placement_id: body.placement_id,
                    is_color: body.is_color,
                    reference_url: body.reference_url,
                    comment: body.comment,
                },
            )
            .await?
    } else {
        state
            .bookings
            .create_range_booking(
                user.user_id,
                RangeBookingInput {
                    spot_id: body.spot_id,
                    start_date: body.start_date,
                    end_date: body.end_date,
                },
            )
            .await?
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Booking created successfully.",
            "bookingId": booking.booking_id,
        })),
    ))
}

/// `GET /bookings/my` — the caller's bookings, newest start date first.
pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.bookings.my_bookings(user.user_id).await?;
    Ok((StatusCode::OK, Json(json!({ "bookings": bookings }))))
}

/// `PATCH /bookings/{id}` — quote as the provider, confirm or decline as
/// the client.
pub async fn update_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
    Json(body): Json<UpdateBookingReq>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .bookings
        .update_booking(
            user.user_id,
            booking_id,
            BookingUpdate {
                price: body.price,
                action: body.action,
            },
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Booking updated successfully.",
            "booking": booking,
        })),
    ))
}

/// `POST /availabilities/{spot_id}` — owner publishes an availability
/// window.
pub async fn add_availability(
    State(state): State<AppState>,
    user: AuthUser,
    Path(spot_id): Path<i64>,
    Json(body): Json<AddAvailabilityReq>,
) -> Result<impl IntoResponse, AppError> {
    let availability = state
        .bookings
        .add_availability(
            user.user_id,
            spot_id,
            body.date_from.as_deref(),
            body.date_to.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Availability added.", "availability": availability })),
    ))
}

/// `GET /availabilities/{spot_id}` — published windows, earliest first.
pub async fn list_availabilities(
    State(state): State<AppState>,
    Path(spot_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let availabilities = state.bookings.list_availabilities(spot_id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "availabilities": availabilities })),
    ))
}

/// `POST /slots/{spot_id}` — owner publishes an appointment slot.
pub async fn add_slot(
    State(state): State<AppState>,
    user: AuthUser,
    Path(spot_id): Path<i64>,
    Json(body): Json<AddSlotReq>,
) -> Result<impl IntoResponse, AppError> {
    let slot = state
        .bookings
        .add_slot(
            user.user_id,
            spot_id,
            body.starts_at.as_deref(),
            body.duration_minutes,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Slot added.", "slot": slot })),
    ))
}

/// `GET /slots/{spot_id}` — upcoming slots for a spot, including booked
/// ones so clients can see what is taken.
pub async fn list_slots(
    State(state): State<AppState>,
    Path(spot_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let slots = state.bookings.list_slots(spot_id).await?;
    Ok((StatusCode::OK, Json(json!({ "slots": slots }))))
}

/// `POST /reviews` — review a booking the caller made.
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateReviewReq>,
) -> Result<impl IntoResponse, AppError> {
    let review = state
        .bookings
        .create_review(user.user_id, body.booking_id, body.rating, body.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Review submitted successfully.",
            "review": review,
        })),
    ))
}
