use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::{
    error::{ApiResult, AppError},
    middleware::{ensure_owner, CurrentAccount},
    models::{MenuItem, OperatingHours},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/owner/venues/{venue_id}/hours", put(replace_hours))
        .route("/owner/venues/{venue_id}/menu", put(replace_menu))
}

/* ---------- HOURS ---------- */

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct HoursInput {
    #[validate(range(min = 0, max = 6))]
    pub weekday: i16,
    pub opens_at: String,
    pub closes_at: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceHoursRequest {
    #[validate(length(max = 28), nested)]
    pub hours: Vec<HoursInput>,
}

fn parse_time(value: &str) -> ApiResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::BadRequest(format!("time {:?} must look like HH:MM", value)))
}

pub fn parse_hours(req: &ReplaceHoursRequest) -> ApiResult<Vec<OperatingHours>> {
    req.validate()?;
    req.hours
        .iter()
        .map(|h| -> ApiResult<OperatingHours> {
            Ok(OperatingHours {
                weekday: h.weekday,
                opens_at: parse_time(&h.opens_at)?,
                closes_at: parse_time(&h.closes_at)?,
            })
        })
        .collect()
}

// PUT /api/owner/venues/{venue_id}/hours
async fn replace_hours(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
    Json(req): Json<ReplaceHoursRequest>,
) -> ApiResult<Json<Vec<OperatingHours>>> {
    let hours = parse_hours(&req)?;
    ensure_owner(&state.db, venue_id, account).await?;

    let mut tx = state.db.pool.begin().await?;
    sqlx::query("DELETE FROM operating_hours WHERE venue_id = $1")
        .bind(venue_id)
        .execute(&mut *tx)
        .await?;
    for h in &hours {
        sqlx::query(
            "INSERT INTO operating_hours (venue_id, weekday, opens_at, closes_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (venue_id, weekday, opens_at) DO UPDATE SET closes_at = EXCLUDED.closes_at"
        )
        .bind(venue_id)
        .bind(h.weekday)
        .bind(h.opens_at)
        .bind(h.closes_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!("venue {}: {} opening windows saved", venue_id, hours.len());
    Ok(Json(OperatingHours::for_venue(venue_id, &state.db).await?))
}

/* ---------- MENU ---------- */

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct MenuItemInput {
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceMenuRequest {
    #[validate(length(max = 200), nested)]
    pub items: Vec<MenuItemInput>,
}

// PUT /api/owner/venues/{venue_id}/menu
async fn replace_menu(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
    Json(req): Json<ReplaceMenuRequest>,
) -> ApiResult<Json<Vec<MenuItem>>> {
    req.validate()?;
    ensure_owner(&state.db, venue_id, account).await?;

    let mut tx = state.db.pool.begin().await?;
    sqlx::query("DELETE FROM menu_items WHERE venue_id = $1")
        .bind(venue_id)
        .execute(&mut *tx)
        .await?;
    for (position, item) in req.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO menu_items (venue_id, name, description, price, position)
             VALUES ($1, $2, $3, $4, $5)"
        )
        .bind(venue_id)
        .bind(item.name.trim())
        .bind(item.description.as_deref())
        .bind(item.price)
        .bind(position as i32)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!("venue {}: menu replaced with {} items", venue_id, req.items.len());
    Ok(Json(MenuItem::for_venue(venue_id, &state.db).await?))
}
