//! Repository for the append-only sync log.

use catsync_core::platform::Platform;
use catsync_core::sync_status::SyncOperation;
use catsync_core::types::DbId;
use sqlx::PgPool;

use crate::models::sync_log::{AppendSyncLog, SyncLogEntry};

/// Column list for `sync_logs`.
const LOG_COLUMNS: &str = "id, product_id, platform, operation, status, message, \
     request_data, response_data, execution_time_ms, created_at";

/// Append and query operations for sync log rows. No update or delete:
/// the log is the audit trail.
pub struct SyncLogRepo;

impl SyncLogRepo {
    /// Append one row. Exactly one call per sync attempt, win or lose.
    pub async fn append(pool: &PgPool, input: &AppendSyncLog) -> Result<SyncLogEntry, sqlx::Error> {
        let sql = format!(
            "INSERT INTO sync_logs \
                (product_id, platform, operation, status, message, \
                 request_data, response_data, execution_time_ms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {LOG_COLUMNS}"
        );
        sqlx::query_as::<_, SyncLogEntry>(&sql)
            .bind(input.product_id)
            .bind(&input.platform)
            .bind(input.operation.as_str())
            .bind(input.status.as_str())
            .bind(&input.message)
            .bind(&input.request_data)
            .bind(&input.response_data)
            .bind(input.execution_time_ms)
            .fetch_one(pool)
            .await
    }

    /// History for one product, newest first.
    pub async fn list_for_product(
        pool: &PgPool,
        product_id: DbId,
        limit: i64,
    ) -> Result<Vec<SyncLogEntry>, sqlx::Error> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM sync_logs \
             WHERE product_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, SyncLogEntry>(&sql)
            .bind(product_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Most recent `bulk_import` row for a platform, if any ever ran.
    ///
    /// This is the fallback source for import status reconstruction.
    pub async fn latest_bulk_import(
        pool: &PgPool,
        platform: Platform,
    ) -> Result<Option<SyncLogEntry>, sqlx::Error> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM sync_logs \
             WHERE platform = $1 AND operation = $2 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, SyncLogEntry>(&sql)
            .bind(platform.as_str())
            .bind(SyncOperation::BulkImport.as_str())
            .fetch_optional(pool)
            .await
    }
}
