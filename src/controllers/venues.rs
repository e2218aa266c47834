use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::{ApiResult, AppError},
    geo::Coordinates,
    inventory::{SeatInventoryModel, SeatStatistics},
    middleware::CurrentAccount,
    models::{hours::is_open_at, Keep, MenuItem, OperatingHours, Venue},
    services::load_layout,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues", get(list_venues))
        .route("/venues/{venue_id}", get(get_venue))
        .route("/venues/{venue_id}/seats", get(get_venue_seats))
}

const DEFAULT_RADIUS_M: f64 = 1_500.0;
const MAX_RADIUS_M: f64 = 20_000.0;

/* ---------- LIST ---------- */

#[derive(Debug, Deserialize)]
pub struct VenuesQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_m: Option<f64>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct VenueSummary {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: Option<String>,
    pub distance_m: Option<f64>,
    pub open_now: bool,
    pub kept: bool,
    pub seats: SeatStatistics,
    pub occupancy_percent: u8,
}

#[derive(sqlx::FromRow)]
struct VenueTotalsRow {
    venue_id: i64,
    total_capacity: i64,
    occupied_seats: i64,
}

#[derive(sqlx::FromRow)]
struct VenueHoursRow {
    venue_id: i64,
    #[sqlx(flatten)]
    hours: OperatingHours,
}

async fn seat_totals(pool: &sqlx::PgPool) -> sqlx::Result<HashMap<i64, SeatStatistics>> {
    let rows = sqlx::query_as::<_, VenueTotalsRow>(
        r#"
        SELECT venue_id,
               COALESCE(SUM(max_table_count::BIGINT * capacity_per_table), 0)::BIGINT AS total_capacity,
               COALESCE(SUM(current_count::BIGINT * capacity_per_table), 0)::BIGINT AS occupied_seats
        FROM table_groups
        GROUP BY venue_id
        "#
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            let total = r.total_capacity.max(0) as u64;
            let occupied = (r.occupied_seats.max(0) as u64).min(total);
            let stats = SeatStatistics {
                total_capacity: total,
                occupied_seats: occupied,
                empty_seats: total - occupied,
            };
            (r.venue_id, stats)
        })
        .collect())
}

async fn all_hours(pool: &sqlx::PgPool) -> sqlx::Result<HashMap<i64, Vec<OperatingHours>>> {
    let rows = sqlx::query_as::<_, VenueHoursRow>(
        "SELECT venue_id, weekday, opens_at, closes_at FROM operating_hours"
    )
    .fetch_all(pool)
    .await?;

    let mut by_venue: HashMap<i64, Vec<OperatingHours>> = HashMap::new();
    for row in rows {
        by_venue.entry(row.venue_id).or_default().push(row.hours);
    }
    Ok(by_venue)
}

/// Keeps venues within `radius_m` of `origin`, nearest first. Without an
/// origin every venue is kept in its original order.
pub fn nearby(venues: Vec<Venue>, origin: Option<Coordinates>, radius_m: f64) -> Vec<(Venue, Option<f64>)> {
    let Some(origin) = origin else {
        return venues.into_iter().map(|v| (v, None)).collect();
    };

    let mut found: Vec<(Venue, Option<f64>)> = venues
        .into_iter()
        .filter_map(|v| {
            let point = Coordinates::new(v.latitude, v.longitude)?;
            let distance = origin.distance_m(&point);
            (distance <= radius_m).then_some((v, Some(distance)))
        })
        .collect();
    found.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    found
}

/// `(offset, limit)` for a 1-based page; page size is kept within 1..=50.
fn page_window(page: Option<u32>, page_size: Option<u32>) -> (usize, usize) {
    let page = u64::from(page.unwrap_or(1).max(1));
    let page_size = u64::from(page_size.unwrap_or(20).clamp(1, 50));
    let offset = (page - 1).saturating_mul(page_size);
    (usize::try_from(offset).unwrap_or(usize::MAX), page_size as usize)
}

fn origin_from(params: &VenuesQuery) -> ApiResult<Option<Coordinates>> {
    match (params.lat, params.lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest("lat/lng out of range".to_string())),
        _ => Err(AppError::BadRequest("lat and lng must be given together".to_string())),
    }
}

async fn kept_ids(state: &AppState, account: Option<CurrentAccount>) -> sqlx::Result<HashSet<i64>> {
    match account {
        Some(account) => Ok(Keep::kept_venue_ids(account.account_id, &state.db)
            .await?
            .into_iter()
            .collect()),
        None => Ok(HashSet::new()),
    }
}

// GET /api/venues
async fn list_venues(
    State(state): State<Arc<AppState>>,
    account: Option<CurrentAccount>,
    Query(params): Query<VenuesQuery>,
) -> ApiResult<Json<Vec<VenueSummary>>> {
    let origin = origin_from(&params)?;
    let radius_m = params.radius_m.unwrap_or(DEFAULT_RADIUS_M).clamp(1.0, MAX_RADIUS_M);
    let (offset, limit) = page_window(params.page, params.page_size);

    // Параллельно тянем заведения, агрегаты мест, часы работы и keeps
    let (venues, totals, venue_hours, kept) = futures::try_join!(
        Venue::all(&state.db),
        seat_totals(&state.db.pool),
        all_hours(&state.db.pool),
        kept_ids(&state, account),
    )?;

    let now = Local::now().naive_local();
    let summaries: Vec<VenueSummary> = nearby(venues, origin, radius_m)
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(venue, distance_m)| {
            let seats = totals.get(&venue.id).copied().unwrap_or_default();
            let open_now = venue_hours
                .get(&venue.id)
                .is_some_and(|h| is_open_at(h, now));
            VenueSummary {
                kept: kept.contains(&venue.id),
                occupancy_percent: seats.occupancy_percent(),
                id: venue.id,
                name: venue.name,
                address: venue.address,
                latitude: venue.latitude,
                longitude: venue.longitude,
                image_url: venue.image_url,
                distance_m,
                open_now,
                seats,
            }
        })
        .collect();

    Ok(Json(summaries))
}

/* ---------- DETAIL ---------- */

#[derive(Debug, Serialize)]
pub struct VenueDetail {
    #[serde(flatten)]
    pub venue: Venue,
    pub hours: Vec<OperatingHours>,
    pub menu: Vec<MenuItem>,
    pub open_now: bool,
    pub kept: bool,
}

fn detail(venue: Venue, hours: Vec<OperatingHours>, menu: Vec<MenuItem>, kept: bool, now: NaiveDateTime) -> VenueDetail {
    VenueDetail {
        open_now: is_open_at(&hours, now),
        venue,
        hours,
        menu,
        kept,
    }
}

// GET /api/venues/{venue_id}
async fn get_venue(
    State(state): State<Arc<AppState>>,
    account: Option<CurrentAccount>,
    Path(venue_id): Path<i64>,
) -> ApiResult<Json<VenueDetail>> {
    let (venue, hours, menu, kept) = futures::try_join!(
        Venue::find(venue_id, &state.db),
        OperatingHours::for_venue(venue_id, &state.db),
        MenuItem::for_venue(venue_id, &state.db),
        kept_ids(&state, account),
    )?;

    let venue = venue.ok_or_else(|| AppError::NotFound(format!("venue {} not found", venue_id)))?;
    let kept = kept.contains(&venue_id);
    Ok(Json(detail(venue, hours, menu, kept, Local::now().naive_local())))
}

/* ---------- SEATS ---------- */

#[derive(Debug, Serialize)]
pub struct FloorStatus {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub statistics: SeatStatistics,
    pub occupancy_percent: u8,
}

#[derive(Debug, Serialize)]
pub struct VenueSeatStatus {
    pub venue_id: i64,
    pub floors: Vec<FloorStatus>,
}

pub fn seat_status(model: &SeatInventoryModel) -> VenueSeatStatus {
    let floors = model
        .categories()
        .iter()
        .filter_map(|category| {
            let statistics = model.category_statistics(&category.id)?;
            Some(FloorStatus {
                id: category.id.clone(),
                name: category.name.clone(),
                occupancy_percent: statistics.occupancy_percent(),
                statistics,
            })
        })
        .collect();

    VenueSeatStatus {
        venue_id: model.venue_id(),
        floors,
    }
}

fn json_response(json: String, cache: &'static str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json"), (header::HeaderName::from_static("x-cache"), cache)],
        Body::from(json),
    )
        .into_response()
}

// GET /api/venues/{venue_id}/seats
async fn get_venue_seats(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> ApiResult<Response> {
    // 1. Пробуем кеш
    if let Some(cached) = state.cache.get_cached_seat_status(venue_id).await {
        return Ok(json_response(cached, "HIT"));
    }

    // 2. Cache miss: собираем статус из БД
    if Venue::find(venue_id, &state.db).await?.is_none() {
        return Err(AppError::NotFound(format!("venue {} not found", venue_id)));
    }
    let layout = load_layout(&state.db, venue_id).await?;
    let model = SeatInventoryModel::load(venue_id, layout)?;
    let status = seat_status(&model);

    // 3. Сохраняем в кеш
    match serde_json::to_string(&status) {
        Ok(json) => {
            state.cache.cache_seat_status(venue_id, &json).await;
            Ok(json_response(json, "MISS"))
        }
        Err(e) => {
            tracing::error!("Failed to serialize seat status for venue {}: {:?}", venue_id, e);
            Ok(Json(status).into_response())
        }
    }
}
