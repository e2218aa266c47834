use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use std::sync::Arc;

use crate::{
    error::{ApiResult, AppError},
    middleware::CurrentAccount,
    models::{Keep, Venue},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/keeps", get(list_keeps))
        .route("/keeps/{venue_id}", put(keep_venue).delete(unkeep_venue))
}

// GET /api/keeps
async fn list_keeps(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
) -> ApiResult<Json<Vec<Keep>>> {
    Ok(Json(Keep::list_for(account.account_id, &state.db).await?))
}

// PUT /api/keeps/{venue_id} - повторный вызов ничего не меняет
async fn keep_venue(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if Venue::find(venue_id, &state.db).await?.is_none() {
        return Err(AppError::NotFound(format!("venue {} not found", venue_id)));
    }

    let created = Keep::add(account.account_id, venue_id, &state.db).await?;
    if created {
        tracing::debug!("account {} kept venue {}", account.account_id, venue_id);
    }
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(serde_json::json!({ "venue_id": venue_id, "kept": true }))))
}

// DELETE /api/keeps/{venue_id}
async fn unkeep_venue(
    State(state): State<Arc<AppState>>,
    account: CurrentAccount,
    Path(venue_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let removed = Keep::remove(account.account_id, venue_id, &state.db).await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("venue {} is not kept", venue_id)))
    }
}
