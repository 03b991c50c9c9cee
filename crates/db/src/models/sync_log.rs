//! Models for the append-only sync log.

use catsync_core::import_status::BulkImportLogView;
use catsync_core::sync_status::{LogStatus, SyncOperation};
use catsync_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sync_logs` table. Append-only; exactly one row is
/// written per sync attempt, win or lose.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SyncLogEntry {
    pub id: DbId,
    pub product_id: Option<DbId>,
    pub platform: String,
    pub operation: String,
    pub status: String,
    pub message: Option<String>,
    pub request_data: Option<serde_json::Value>,
    pub response_data: Option<serde_json::Value>,
    pub execution_time_ms: Option<i64>,
    pub created_at: Timestamp,
}

impl SyncLogEntry {
    /// Project a `bulk_import` row into the core reconstruction view.
    ///
    /// Counts come from the response snapshot written by the import task
    /// (`{"imported": N, "total": M}`); absent or malformed snapshots
    /// simply yield no counts.
    pub fn bulk_import_view(&self) -> Option<BulkImportLogView> {
        let status = LogStatus::parse(&self.status).ok()?;
        let counts = self.response_data.as_ref();
        Some(BulkImportLogView {
            status,
            message: self.message.clone(),
            created_at: self.created_at,
            imported: counts.and_then(|v| v.get("imported")).and_then(|v| v.as_u64()),
            total: counts.and_then(|v| v.get("total")).and_then(|v| v.as_u64()),
        })
    }
}

/// DTO for appending a log row.
#[derive(Debug, Clone)]
pub struct AppendSyncLog {
    pub product_id: Option<DbId>,
    pub platform: String,
    pub operation: SyncOperation,
    pub status: LogStatus,
    pub message: Option<String>,
    pub request_data: Option<serde_json::Value>,
    pub response_data: Option<serde_json::Value>,
    pub execution_time_ms: Option<i64>,
}
