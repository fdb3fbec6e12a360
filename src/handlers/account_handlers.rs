//! HTTP handlers for registration, login, and the /users/me profile.
//! Registration and login issue JWTs; everything under /users/me requires
//! one via the `AuthUser` extractor.

use crate::{
    auth::AuthUser,
    errors::AppError,
    services::account_service::{ProfileUpdate, RegisterInput},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

/// Request body for `POST /api/register/user`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserReq {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<String>,
    pub role: Option<String>,
}

/// Query params for `POST /api/register/artist`.
#[derive(Debug, Deserialize)]
pub struct RegisterArtistQuery {
    pub session_id: Option<String>,
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginReq {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for `PATCH /users/me`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeReq {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<String>,
}

/// `POST /api/register/user` — create a client account and issue a token.
pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserReq>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .accounts
        .register_user(RegisterInput {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            phone_number: body.phone_number,
            birth_date: body.birth_date,
            role: body.role,
        })
        .await?;

    let token = issue_token(&state, user.user_id, &user.role)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered.", "token": token })),
    ))
}

/// `POST /api/register/artist?session_id=` — create an artist account from a
/// paid checkout session. The session metadata carries the registration
/// form; the response includes the id of the spot created for the artist.
pub async fn register_artist(
    State(state): State<AppState>,
    Query(query): Query<RegisterArtistQuery>,
) -> Result<impl IntoResponse, AppError> {
    let registration = state
        .accounts
        .register_artist(query.session_id.as_deref().unwrap_or(""))
        .await?;

    let token = issue_token(
        &state,
        registration.user.user_id,
        &registration.user.role,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Artist registered after successful payment.",
            "token": token,
            "spotId": registration.spot_id,
        })),
    ))
}

/// `POST /login` — verify credentials and issue a token.
///
/// Unknown email and wrong password get the same 401, so the endpoint
/// cannot be used to probe which emails exist.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (body.email.as_deref(), body.password.as_deref()) else {
        return Err(AppError::bad_request(
            "Missing required fields: email and password are needed.",
        ));
    };

    let user = state
        .accounts
        .verify_login(email, password)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password."))?;

    let token = issue_token(&state, user.user_id, &user.role)?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Login successful.",
            "token": token,
            "user": {
                "userId": user.user_id,
                "email": user.email,
                "role": user.role,
                "firstName": user.first_name,
                "lastName": user.last_name,
            },
        })),
    ))
}

/// `GET /users/me` — the caller's profile with their booking history.
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.accounts.me(user.user_id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "user": profile })),
    ))
}

/// `PATCH /users/me` — partial profile update.
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateMeReq>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .accounts
        .update_me(
            user.user_id,
            ProfileUpdate {
                email: body.email,
                password: body.password,
                first_name: body.first_name,
                last_name: body.last_name,
                phone_number: body.phone_number,
                birth_date: body.birth_date,
            },
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "user": updated })),
    ))
}

/// `DELETE /users/me` — delete the caller's account and related data.
pub async fn delete_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.delete_me(user.user_id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "message": "User and related data deleted" })),
    ))
}

/// Sign a JWT for the given user, mapping signing failures to a 500.
fn issue_token(state: &AppState, user_id: i64, role: &str) -> Result<String, AppError> {
    state
        .tokens
        .issue(user_id, role)
        .map_err(|err| AppError::internal(format!("Failed to issue token: {err}")))
}
