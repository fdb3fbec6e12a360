//! src/services/spot_service.rs
//!
//! SpotService — catalog lookups and everything read or written about the
//! listings themselves: the filtered, paginated public list, the detail
//! view, and the owner-gated create/update operations. Booking traffic
//! lives in `booking_service`.

use crate::models::{city::City, style::Style};
use crate::services::{ServiceError, ServiceResult, ensure_owner};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Filters and paging accepted by the public spot listing.
#[derive(Debug, Default, Clone)]
pub struct SpotFilter {
    pub city_ids: Vec<i64>,
    pub style_ids: Vec<i64>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Profile fields accepted when creating or updating a listing. On update,
/// absent fields are left untouched and `style_ids` replaces the whole set
/// of style links when present.
#[derive(Debug, Default)]
pub struct SpotInput {
    pub city_id: Option<i64>,
    pub description: Option<String>,
    pub street_address: Option<String>,
    pub instagram_link: Option<String>,
    pub portfolio_link: Option<String>,
    pub image_url: Option<String>,
    pub style_ids: Option<Vec<i64>>,
}

/// One page of listings plus pagination metadata.
#[derive(Debug, Serialize)]
pub struct SpotPage {
    pub spots: Vec<SpotListItem>,
    pub pagination: Pagination,
}

/// Paging metadata computed from the same filters as the page contents.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// One listing in the public list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotListItem {
    pub spot_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: Option<CityRef>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub social: SocialLinks,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub styles: Vec<StyleRef>,
}

/// The listing detail view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetail {
    pub spot_id: i64,
    pub user: SpotOwner,
    pub location: Option<SpotLocation>,
    pub description: Option<String>,
    pub social: SocialLinks,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub styles: Vec<StyleEntry>,
}

/// Owner block nested in the detail view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotOwner {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Location block nested in the detail view, absent when the listing has no
/// city set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotLocation {
    pub city_id: i64,
    pub city: String,
    pub country: String,
    pub address: Option<String>,
}

/// City reference as served in listings and the catalog.
#[derive(Debug, Serialize)]
pub struct CityRef {
    pub id: i64,
    pub name: String,
    pub country: String,
}

/// Social links block.
#[derive(Debug, Serialize)]
pub struct SocialLinks {
    pub instagram: Option<String>,
    pub portfolio: Option<String>,
}

/// Compact style tag used in list rows.
#[derive(Debug, Serialize)]
pub struct StyleRef {
    pub id: i64,
    pub name: String,
}

/// Full style tag used in the detail view and the catalog.
#[derive(Debug, Serialize)]
pub struct StyleEntry {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(FromRow)]
struct SpotListRow {
    spot_id: i64,
    user_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    city_id: Option<i64>,
    city_name: Option<String>,
    country_name: Option<String>,
    description: Option<String>,
    street_address: Option<String>,
    instagram_link: Option<String>,
    portfolio_link: Option<String>,
    image_url: Option<String>,
}

#[derive(FromRow)]
struct SpotDetailRow {
    spot_id: i64,
    user_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: Option<String>,
    city_id: Option<i64>,
    city_name: Option<String>,
    country_name: Option<String>,
    description: Option<String>,
    street_address: Option<String>,
    instagram_link: Option<String>,
    portfolio_link: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct StyleForSpotRow {
    spot_id: i64,
    style_id: i64,
    style_name: String,
    description: Option<String>,
}

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

/// SpotService reads and writes listings:
/// - The public list joins owners and cities, applies the optional filters,
///   and pages with clamped limits.
/// - Create/update are owner-gated and keep the style links in step inside
///   one transaction.
/// - City and style catalogs are served from here as well.
#[derive(Clone)]
pub struct SpotService {
    /// Shared SQLite connection pool.
    db: Arc<SqlitePool>,
}

impl SpotService {
    /// Create a new SpotService backed by the provided SQLite pool.
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// List spots with optional filters, paginated.
    ///
    /// - `limit` is clamped to 1..=50 (default 10); `page` floors at 1.
    /// - City and style filters OR within themselves and AND between each
    ///   other; `search` matches the owner's first or last name.
    /// - Pagination metadata is computed from a COUNT over the same
    ///   filters, so the numbers always agree with the page contents.
    pub async fn list_spots(&self, filter: SpotFilter) -> ServiceResult<SpotPage> {
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = filter.page.unwrap_or(1).max(1);
        // Saturate so an absurd page number lands past the end instead of
        // wrapping the OFFSET negative.
        let offset = (page - 1).saturating_mul(limit);

        let mut count_builder = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM spots s JOIN users u ON u.user_id = s.user_id WHERE 1 = 1",
        );
        push_filters(&mut count_builder, &filter);
        let total_items: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&*self.db)
            .await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT s.spot_id, s.user_id, u.first_name, u.last_name, u.email,
                    s.city_id, c.name AS city_name, c.country_name,
                    s.description, s.street_address, s.instagram_link, s.portfolio_link,
                    s.image_url
             FROM spots s
             JOIN users u ON u.user_id = s.user_id
             LEFT JOIN cities c ON c.city_id = s.city_id
             WHERE 1 = 1",
        );
        push_filters(&mut builder, &filter);
        builder.push(" ORDER BY s.spot_id DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows: Vec<SpotListRow> = builder.build_query_as().fetch_all(&*self.db).await?;

        let page_ids: Vec<i64> = rows.iter().map(|row| row.spot_id).collect();
        let mut styles_by_spot = self.styles_for_spots(&page_ids).await?;

        let spots = rows
            .into_iter()
            .map(|row| SpotListItem {
                spot_id: row.spot_id,
                user_id: row.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                city: city_ref(row.city_id, row.city_name, row.country_name),
                description: row.description,
                address: row.street_address,
                social: SocialLinks {
                    instagram: row.instagram_link,
                    portfolio: row.portfolio_link,
                },
                image_url: row.image_url,
                styles: styles_by_spot.remove(&row.spot_id).unwrap_or_default(),
            })
            .collect();

        let total_pages = (total_items + limit - 1) / limit;

        Ok(SpotPage {
            spots,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_items,
                items_per_page: limit,
                has_next_page: page < total_pages,
                has_previous_page: page > 1,
            },
        })
    }

    /// Fetch the detail view for a spot by its raw path id.
    ///
    /// An unparseable id is a Validation error ("Invalid spot ID format"),
    /// a missing spot is NotFound.
    pub async fn get_spot(&self, raw_id: &str) -> ServiceResult<SpotDetail> {
        let spot_id = parse_spot_id(raw_id)?;
        self.fetch_detail(spot_id).await
    }

    /// Create a listing owned by the caller.
    ///
    /// All profile fields are optional; style links are written in the same
    /// transaction as the spot row. Returns the new spot id.
    pub async fn create_spot(&self, user_id: i64, input: SpotInput) -> ServiceResult<i64> {
        let mut tx = self.db.begin().await?;

        let spot_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO spots (user_id, city_id, description, street_address, instagram_link,
                                portfolio_link, image_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING spot_id",
        )
        .bind(user_id)
        .bind(input.city_id)
        .bind(&input.description)
        .bind(&input.street_address)
        .bind(&input.instagram_link)
        .bind(&input.portfolio_link)
        .bind(&input.image_url)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(style_ids) = &input.style_ids {
            link_styles(&mut tx, spot_id, style_ids).await?;
        }

        tx.commit().await?;
        debug!("created spot {} for user {}", spot_id, user_id);
        Ok(spot_id)
    }

    /// Update a listing the caller owns.
    ///
    /// - Missing spot is NotFound, someone else's spot is Authorization.
    /// - Only provided fields are touched; `style_ids` replaces the whole
    ///   link set when present.
    ///
    /// Returns the refreshed detail view.
    pub async fn update_spot(
        &self,
        user_id: i64,
        raw_id: &str,
        input: SpotInput,
    ) -> ServiceResult<SpotDetail> {
        let spot_id = parse_spot_id(raw_id)?;

        let owner_id = sqlx::query_scalar::<_, i64>("SELECT user_id FROM spots WHERE spot_id = ?")
            .bind(spot_id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Spot not found".into()))?;
        ensure_owner(user_id, owner_id, "Unauthorized to edit this spot")?;

        let mut tx = self.db.begin().await?;

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE spots SET ");
        let mut fields = builder.separated(", ");
        let mut dirty = false;
        if let Some(city_id) = input.city_id {
            fields.push("city_id = ").push_bind_unseparated(city_id);
            dirty = true;
        }
        if let Some(description) = &input.description {
            fields.push("description = ").push_bind_unseparated(description);
            dirty = true;
        }
        if let Some(street_address) = &input.street_address {
            fields
                .push("street_address = ")
                .push_bind_unseparated(street_address);
            dirty = true;
        }
        if let Some(instagram_link) = &input.instagram_link {
            fields
                .push("instagram_link = ")
                .push_bind_unseparated(instagram_link);
            dirty = true;
        }
        if let Some(portfolio_link) = &input.portfolio_link {
            fields
                .push("portfolio_link = ")
                .push_bind_unseparated(portfolio_link);
            dirty = true;
        }
        if let Some(image_url) = &input.image_url {
            fields.push("image_url = ").push_bind_unseparated(image_url);
            dirty = true;
        }
        if dirty {
            builder.push(" WHERE spot_id = ");
            builder.push_bind(spot_id);
            builder.build().execute(&mut *tx).await?;
        }

        if let Some(style_ids) = &input.style_ids {
            sqlx::query("DELETE FROM spot_styles WHERE spot_id = ?")
                .bind(spot_id)
                .execute(&mut *tx)
                .await?;
            link_styles(&mut tx, spot_id, style_ids).await?;
        }

        tx.commit().await?;
        debug!("updated spot {}", spot_id);
        self.fetch_detail(spot_id).await
    }

    /// List all cities, ordered by country then name.
    pub async fn list_cities(&self) -> ServiceResult<Vec<CityRef>> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT city_id, name, country_name FROM cities ORDER BY country_name ASC, name ASC",
        )
        .fetch_all(&*self.db)
        .await?;

        Ok(cities
            .into_iter()
            .map(|city| CityRef {
                id: city.city_id,
                name: city.name,
                country: city.country_name,
            })
            .collect())
    }

    /// List all styles, ordered by name.
    pub async fn list_styles(&self) -> ServiceResult<Vec<StyleEntry>> {
        let styles = sqlx::query_as::<_, Style>(
            "SELECT style_id, style_name, description FROM styles ORDER BY style_name ASC",
        )
        .fetch_all(&*self.db)
        .await?;

        Ok(styles
            .into_iter()
            .map(|style| StyleEntry {
                id: style.style_id,
                name: style.style_name,
                description: style.description,
            })
            .collect())
    }

    /// Assemble the detail view for a known spot id.
    async fn fetch_detail(&self, spot_id: i64) -> ServiceResult<SpotDetail> {
        let row = sqlx::query_as::<_, SpotDetailRow>(
            "SELECT s.spot_id, s.user_id, u.first_name, u.last_name, u.email, u.phone_number,
                    s.city_id, c.name AS city_name, c.country_name,
                    s.description, s.street_address, s.instagram_link, s.portfolio_link,
                    s.image_url, s.created_at
             FROM spots s
             JOIN users u ON u.user_id = s.user_id
             LEFT JOIN cities c ON c.city_id = s.city_id
             WHERE s.spot_id = ?",
        )
        .bind(spot_id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Spot not found".into()))?;

        let styles = sqlx::query_as::<_, StyleForSpotRow>(
            "SELECT ss.spot_id, st.style_id, st.style_name, st.description
             FROM spot_styles ss
             JOIN styles st ON st.style_id = ss.style_id
             WHERE ss.spot_id = ?
             ORDER BY st.style_name ASC",
        )
        .bind(spot_id)
        .fetch_all(&*self.db)
        .await?;

        let location = match (&row.city_id, row.city_name, row.country_name) {
            (Some(city_id), Some(city), Some(country)) => Some(SpotLocation {
                city_id: *city_id,
                city,
                country,
                address: row.street_address,
            }),
            _ => None,
        };

        Ok(SpotDetail {
            spot_id: row.spot_id,
            user: SpotOwner {
                user_id: row.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone_number: row.phone_number,
            },
            location,
            description: row.description,
            social: SocialLinks {
                instagram: row.instagram_link,
                portfolio: row.portfolio_link,
            },
            image_url: row.image_url,
            created_at: row.created_at,
            styles: styles
                .into_iter()
                .map(|style| StyleEntry {
                    id: style.style_id,
                    name: style.style_name,
                    description: style.description,
                })
                .collect(),
        })
    }

    /// Fetch style tags for a set of spots in one query, grouped by spot.
    async fn styles_for_spots(
        &self,
        spot_ids: &[i64],
    ) -> ServiceResult<HashMap<i64, Vec<StyleRef>>> {
        let mut by_spot: HashMap<i64, Vec<StyleRef>> = HashMap::new();
        if spot_ids.is_empty() {
            return Ok(by_spot);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT ss.spot_id, st.style_id, st.style_name, st.description
             FROM spot_styles ss
             JOIN styles st ON st.style_id = ss.style_id
             WHERE ss.spot_id IN (",
        );
        let mut ids = builder.separated(", ");
        for spot_id in spot_ids {
            ids.push_bind(*spot_id);
        }
        builder.push(") ORDER BY st.style_name ASC");

        let rows: Vec<StyleForSpotRow> = builder.build_query_as().fetch_all(&*self.db).await?;
        for row in rows {
            by_spot.entry(row.spot_id).or_default().push(StyleRef {
                id: row.style_id,
                name: row.style_name,
            });
        }

        Ok(by_spot)
    }
}

/// Link a spot to a set of styles. Duplicate ids in the input are ignored.
pub(crate) async fn link_styles(
    tx: &mut Transaction<'_, Sqlite>,
    spot_id: i64,
    style_ids: &[i64],
) -> ServiceResult<()> {
    if style_ids.is_empty() {
        return Ok(());
    }

    let mut builder =
        QueryBuilder::<Sqlite>::new("INSERT OR IGNORE INTO spot_styles (spot_id, style_id) ");
    builder.push_values(style_ids, |mut row, style_id| {
        row.push_bind(spot_id);
        row.push_bind(style_id);
    });
    builder.build().execute(&mut **tx).await?;

    Ok(())
}

/// Append the optional listing filters to a query ending in a WHERE clause.
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &SpotFilter) {
    if !filter.city_ids.is_empty() {
        builder.push(" AND s.city_id IN (");
        let mut ids = builder.separated(", ");
        for city_id in &filter.city_ids {
            ids.push_bind(*city_id);
        }
        builder.push(")");
    }

    if !filter.style_ids.is_empty() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM spot_styles ss \
             WHERE ss.spot_id = s.spot_id AND ss.style_id IN (",
        );
        let mut ids = builder.separated(", ");
        for style_id in &filter.style_ids {
            ids.push_bind(*style_id);
        }
        builder.push("))");
    }

    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", search);
        builder.push(" AND (u.first_name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR u.last_name LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

/// Build the optional city block shared by list rows.
fn city_ref(
    city_id: Option<i64>,
    city_name: Option<String>,
    country_name: Option<String>,
) -> Option<CityRef> {
    match (city_id, city_name, country_name) {
        (Some(id), Some(name), Some(country)) => Some(CityRef { id, name, country }),
        _ => None,
    }
}

/// Parse a spot id path segment.
fn parse_spot_id(raw: &str) -> ServiceResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::Validation("Invalid spot ID format".into()))
}
