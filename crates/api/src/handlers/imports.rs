//! Handlers for bulk catalog imports.
//!
//! `start` returns immediately with a pollable import id; the pull runs
//! as a detached background task owned by the orchestrator.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catsync_core::import_status::ImportStatusData;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Typed response for the start endpoint.
#[derive(Debug, Serialize)]
pub struct StartResult {
    pub import_id: String,
}

/// POST /api/v1/import/start
///
/// Begin a full catalog pull on the most recently connected active
/// connection. Fails fast when no usable connection exists.
pub async fn start_import(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<DataResponse<StartResult>>)> {
    let import_id = state.orchestrator.start_import().await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: StartResult { import_id },
        }),
    ))
}

/// Query parameters for the status endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub import_id: Option<String>,
}

/// GET /api/v1/import/status
///
/// Poll import progress. Unknown ids and polls after a restart are
/// reconstructed from the sync log rather than rejected.
pub async fn import_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> AppResult<Json<DataResponse<ImportStatusData>>> {
    let data = state
        .orchestrator
        .get_status(params.import_id.as_deref())
        .await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/import/{import_id}/cancel
///
/// Cooperative cancel; returns whether a live run was actually stopped.
pub async fn cancel_import(
    State(state): State<AppState>,
    Path(import_id): Path<String>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let cancelled = state.orchestrator.cancel_import(&import_id).await;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "cancelled": cancelled }),
    }))
}

/// POST /api/v1/import/clear
///
/// Evict finished runs from the status cache so a fresh poll reports
/// `idle`.
pub async fn clear_completed(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    state.orchestrator.clear_completed().await;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "cleared": true }),
    }))
}
