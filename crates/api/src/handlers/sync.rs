//! Handlers for single-product and batch sync.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use catsync_core::batch::BatchReport;
use catsync_core::error::CoreError;
use catsync_core::sync_status::SyncOperation;
use catsync_core::types::DbId;
use catsync_db::repositories::{ChannelMappingRepo, SyncLogRepo};
use catsync_sync::{BatchSyncCoordinator, ProductSync, SyncOutcome};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for the single-product sync endpoint.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub operation: SyncOperation,
    /// Explicit connection to use; defaults to the most recently
    /// connected active one.
    pub connection_id: Option<DbId>,
}

/// POST /api/v1/products/{id}/sync
///
/// Push one product to the platform. `create` on an already linked
/// product degrades to an update rather than duplicating it remotely.
pub async fn sync_product(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SyncRequest>,
) -> AppResult<Json<DataResponse<SyncOutcome>>> {
    let outcome = state
        .engine
        .sync_product(id, body.operation, body.connection_id)
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// Body for the batch sync endpoint.
#[derive(Debug, Deserialize)]
pub struct BatchSyncRequest {
    pub product_ids: Vec<DbId>,
    pub operation: SyncOperation,
    pub connection_id: Option<DbId>,
    /// Per-chunk concurrency; clamped to 1..=10, default 5.
    pub batch_size: Option<usize>,
}

/// POST /api/v1/sync/batch
///
/// Push up to 50 products in bounded-concurrency chunks. Individual
/// failures land in the report instead of aborting the batch.
pub async fn batch_sync(
    State(state): State<AppState>,
    Json(body): Json<BatchSyncRequest>,
) -> AppResult<Json<DataResponse<BatchReport>>> {
    let coordinator = BatchSyncCoordinator::new(Arc::clone(&state.engine));
    let report = coordinator
        .sync_many(
            &body.product_ids,
            body.operation,
            body.connection_id,
            body.batch_size,
        )
        .await?;
    Ok(Json(DataResponse { data: report }))
}

/// Query parameters for the per-product log endpoint.
#[derive(Debug, Deserialize)]
pub struct LogParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/products/{id}/sync-logs
pub async fn product_sync_logs(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<LogParams>,
) -> AppResult<Json<DataResponse<Vec<catsync_db::models::sync_log::SyncLogEntry>>>> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let logs = SyncLogRepo::list_for_product(&state.pool, id, limit).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// Mapping payload enriched with the derived admin URL.
#[derive(Debug, Serialize)]
pub struct MappingResult {
    #[serde(flatten)]
    pub mapping: catsync_db::models::channel_mapping::ChannelMapping,
    /// Deep link into the platform's admin UI, when derivable.
    pub admin_url: Option<String>,
}

/// GET /api/v1/products/{id}/mapping
pub async fn product_mapping(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MappingResult>>> {
    let platform = state.engine.platform();
    let mapping = ChannelMappingRepo::find(&state.pool, id, platform)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "channel mapping",
            id,
        })?;
    let admin_url = mapping.admin_url();
    Ok(Json(DataResponse {
        data: MappingResult { mapping, admin_url },
    }))
}
