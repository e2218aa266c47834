//! owner_seats.rs
//!
//! Консоль владельца: сессия управления занятостью столов.
//!
//! Сессия живет в памяти (`SeatSessions`) до явного сохранения. Изменения
//! счетчиков локальные, `save` отправляет все группы столов заведения в БД.
//! Пока сохранение в процессе, повторный `save` отвечает 409, а правки
//! продолжают приниматься.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{ApiResult, AppError},
    inventory::{Adjustment, SaveOutcome, SaveStatus, SeatInventoryModel, SeatStatistics},
    middleware::{ensure_owner, CurrentAccount},
    models::TableGroup,
    services::{load_layout, SessionKey},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/owner/venues/{venue_id}/seats", get(get_session))
        .route(
            "/owner/venues/{venue_id}/seats/session",
            post(open_session).delete(close_session),
        )
        .route("/owner/venues/{venue_id}/seats/floor", patch(select_floor))
        .route("/owner/venues/{venue_id}/seats/adjust", patch(adjust_count))
        .route("/owner/venues/{venue_id}/seats/save", post(save_session))
}

/* ---------- VIEW ---------- */

#[derive(Debug, Serialize)]
pub struct FloorTab {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SeatSessionView {
    pub venue_id: i64,
    pub selected_floor: String,
    pub floors: Vec<FloorTab>,
    pub table_groups: Vec<TableGroup>,
    pub statistics: SeatStatistics,
    pub status: SaveStatus,
}

impl From<&SeatInventoryModel> for SeatSessionView {
    fn from(model: &SeatInventoryModel) -> Self {
        SeatSessionView {
            venue_id: model.venue_id(),
            selected_floor: model.selected_category().id.clone(),
            floors: model
                .categories()
                .iter()
                .map(|c| FloorTab { id: c.id.clone(), name: c.name.clone() })
                .collect(),
            table_groups: model.displayed().cloned().collect(),
            statistics: model.statistics(),
            status: model.status(),
        }
    }
}

/* ---------- helpers ---------- */

async fn owner_key(state: &AppState, venue_id: i64, account: CurrentAccount) -> ApiResult<SessionKey> {
    ensure_owner(&state.db, venue_id, account).await?;
    Ok(SessionKey { account_id: account.account_id, venue_id })
}

fn no_session(venue_id: i64) -> AppError {
    AppError::NotFound(format!("no open seat session for venue {}", venue_id))
}

fn view_of(state: &AppState, key: SessionKey) -> ApiResult<SeatSessionView> {
    state
        .sessions
        .view(key, |m| SeatSessionView::from(m))
        .ok_or_else(|| no_session(key.venue_id))
}

/* ---------- SESSION ---------- */

// POST /api/owner/venues/{venue_id}/seats/session
async fn open_session(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let key = owner_key(&state, venue_id, account).await?;

    // Не сбрасываем сессию, пока её сохранение не завершилось
    if state.sessions.view(key, |m| m.is_saving()) == Some(true) {
        return Err(AppError::Conflict("seat usage is being saved, try again".to_string()));
    }

    let layout = load_layout(&state.db, venue_id).await?;
    let model = SeatInventoryModel::load(venue_id, layout)?;
    let view = SeatSessionView::from(&model);
    state.sessions.open(key, model);

    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/owner/venues/{venue_id}/seats
async fn get_session(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
) -> ApiResult<Json<SeatSessionView>> {
    let key = owner_key(&state, venue_id, account).await?;
    Ok(Json(view_of(&state, key)?))
}

// DELETE /api/owner/venues/{venue_id}/seats/session
async fn close_session(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let key = owner_key(&state, venue_id, account).await?;
    if state.sessions.close(key) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(no_session(venue_id))
    }
}

/* ---------- MUTATIONS ---------- */

#[derive(Debug, Deserialize)]
pub struct SelectFloorRequest {
    pub floor_id: String,
}

// PATCH /api/owner/venues/{venue_id}/seats/floor
// Неизвестный этаж - не ошибка, состояние не меняется
async fn select_floor(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
    Json(req): Json<SelectFloorRequest>,
) -> ApiResult<Json<SeatSessionView>> {
    let key = owner_key(&state, venue_id, account).await?;
    state
        .sessions
        .update(key, |m| {
            m.select_category(&req.floor_id);
            SeatSessionView::from(&*m)
        })
        .map(Json)
        .ok_or_else(|| no_session(venue_id))
}

#[derive(Debug, Deserialize)]
pub struct AdjustCountRequest {
    pub table_group_id: i64,
    pub delta: i32,
}

pub fn parse_delta(delta: i32) -> ApiResult<Adjustment> {
    Adjustment::try_from(delta)
        .map_err(|d| AppError::BadRequest(format!("delta must be 1 or -1, got {}", d)))
}

// PATCH /api/owner/venues/{venue_id}/seats/adjust
async fn adjust_count(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
    Json(req): Json<AdjustCountRequest>,
) -> ApiResult<Json<SeatSessionView>> {
    let adjustment = parse_delta(req.delta)?;
    let key = owner_key(&state, venue_id, account).await?;
    state
        .sessions
        .update(key, |m| {
            m.adjust_count(req.table_group_id, adjustment);
            SeatSessionView::from(&*m)
        })
        .map(Json)
        .ok_or_else(|| no_session(venue_id))
}

/* ---------- SAVE ---------- */

// POST /api/owner/venues/{venue_id}/seats/save
async fn save_session(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
) -> ApiResult<Json<SeatSessionView>> {
    let key = owner_key(&state, venue_id, account).await?;

    let outcome = state
        .sessions
        .save(key, &state.seat_store)
        .await
        .ok_or_else(|| no_session(venue_id))??;

    match outcome {
        SaveOutcome::Saved => Ok(Json(view_of(&state, key)?)),
        SaveOutcome::AlreadySaving => Err(AppError::Conflict(
            "a save for this venue is already in progress".to_string(),
        )),
    }
}
