//! HTTP handlers for spot listings and the city/style catalogs.
//! Query parsing and response envelopes live here; filtering, pagination,
//! and ownership rules are `SpotService`'s problem.

use crate::{
    auth::AuthUser,
    errors::AppError,
    services::spot_service::{SpotFilter, SpotInput},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

/// Query params accepted by `GET /api/spots`. `cityIds` and `styleIds` are
/// comma-separated lists; entries that do not parse are skipped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSpotsQuery {
    pub city_ids: Option<String>,
    pub style_ids: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request body shared by POST and PATCH on spots.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotBody {
    pub city_id: Option<i64>,
    pub description: Option<String>,
    pub street_address: Option<String>,
    pub instagram_link: Option<String>,
    pub portfolio_link: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub style_ids: Option<Vec<i64>>,
}

impl From<SpotBody> for SpotInput {
    fn from(body: SpotBody) -> Self {
        Self {
            city_id: body.city_id,
            description: body.description,
            street_address: body.street_address,
            instagram_link: body.instagram_link,
            portfolio_link: body.portfolio_link,
            image_url: body.image_url,
            style_ids: body.style_ids,
        }
    }
}

/// `GET /api/spots` — filtered, paginated listing.
pub async fn list_spots(
    State(state): State<AppState>,
    Query(query): Query<ListSpotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .spots
        .list_spots(SpotFilter {
            city_ids: parse_id_list(query.city_ids.as_deref()),
            style_ids: parse_id_list(query.style_ids.as_deref()),
            search: query.search,
            page: query.page,
            limit: query.limit,
        })
        .await?;

    Ok((StatusCode::OK, Json(page)))
}

/// `GET /api/spots/{id}` — full detail for one spot.
pub async fn get_spot(
    State(state): State<AppState>,
    Path(spot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let spot = state.spots.get_spot(&spot_id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "spot": spot })),
    ))
}

/// `POST /api/spots` — create a listing owned by the caller.
pub async fn create_spot(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<SpotBody>,
) -> Result<impl IntoResponse, AppError> {
    let spot_id = state.spots.create_spot(user.user_id, body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Spot created successfully",
            "spotId": spot_id,
        })),
    ))
}

/// `PATCH /api/spots/{id}` — owner-only partial update.
pub async fn update_spot(
    State(state): State<AppState>,
    user: AuthUser,
    Path(spot_id): Path<String>,
    Json(body): Json<SpotBody>,
) -> Result<impl IntoResponse, AppError> {
    let spot = state
        .spots
        .update_spot(user.user_id, &spot_id, body.into())
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Spot updated successfully",
            "spot": spot,
        })),
    ))
}

/// `GET /cities` — the city catalog.
pub async fn list_cities(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cities = state.spots.list_cities().await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "cities": cities })),
    ))
}

/// `GET /styles` — the style catalog.
pub async fn list_styles(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let styles = state.spots.list_styles().await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "styles": styles })),
    ))
}

/// Split a comma-separated id list, dropping entries that do not parse.
fn parse_id_list(raw: Option<&str>) -> Vec<i64> {
    raw.map(|raw| {
        raw.split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::parse_id_list;

    #[test]
    fn id_list_skips_unparseable_entries() {
        assert_eq!(parse_id_list(Some("1, 2,x,4")), vec![1, 2, 4]);
        assert_eq!(parse_id_list(Some("")), Vec::<i64>::new());
        assert_eq!(parse_id_list(None), Vec::<i64>::new());
    }
}
