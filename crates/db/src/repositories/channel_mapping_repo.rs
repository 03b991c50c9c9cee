//! Repository for channel mappings.

use catsync_core::error::CoreError;
use catsync_core::platform::Platform;
use catsync_core::sync_status::SyncStatus;
use catsync_core::types::DbId;
use sqlx::PgPool;

use crate::models::channel_mapping::{ChannelMapping, UpsertChannelMapping};

/// Column list for `channel_mappings`.
const MAPPING_COLUMNS: &str = "id, product_id, platform, external_id, external_variant_id, \
     sync_status, last_synced, error_message, error_count, sync_data, \
     created_at, updated_at";

/// Errors from the mapping store boundary.
#[derive(Debug, thiserror::Error)]
pub enum MappingStoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The proposed status transition is illegal for the existing row.
    #[error(transparent)]
    Transition(CoreError),
}

/// Provides the idempotent upsert and queries for channel mappings.
pub struct ChannelMappingRepo;

impl ChannelMappingRepo {
    /// Idempotent upsert keyed by `(product_id, platform)`.
    ///
    /// Inserts the row on first attempt; subsequent calls overwrite
    /// fields, bump `error_count` when the new status is `error`, reset
    /// it on `success`, and refresh `last_synced`. An `external_id` is
    /// never overwritten with NULL once set.
    ///
    /// Illegal status transitions (per [`SyncStatus::can_transition_to`])
    /// are rejected before any write.
    pub async fn upsert(
        pool: &PgPool,
        product_id: DbId,
        platform: Platform,
        input: &UpsertChannelMapping,
    ) -> Result<ChannelMapping, MappingStoreError> {
        if let Some(existing) = Self::find(pool, product_id, platform).await? {
            let current = existing
                .status()
                .map_err(MappingStoreError::Transition)?;
            current
                .validate_transition(input.sync_status)
                .map_err(MappingStoreError::Transition)?;
        }

        let sql = format!(
            "INSERT INTO channel_mappings \
                (product_id, platform, external_id, external_variant_id, sync_status, \
                 last_synced, error_message, error_count, sync_data) \
             VALUES ($1, $2, $3, $4, $5, now(), $6, \
                 CASE WHEN $5 = 'error' THEN 1 ELSE 0 END, $7) \
             ON CONFLICT (product_id, platform) DO UPDATE SET \
                external_id = COALESCE(EXCLUDED.external_id, channel_mappings.external_id), \
                external_variant_id = COALESCE(EXCLUDED.external_variant_id, channel_mappings.external_variant_id), \
                sync_status = EXCLUDED.sync_status, \
                last_synced = now(), \
                error_message = EXCLUDED.error_message, \
                error_count = CASE \
                    WHEN EXCLUDED.sync_status = 'error' THEN channel_mappings.error_count + 1 \
                    WHEN EXCLUDED.sync_status = 'success' THEN 0 \
                    ELSE channel_mappings.error_count \
                END, \
                sync_data = COALESCE(EXCLUDED.sync_data, channel_mappings.sync_data), \
                updated_at = now() \
             RETURNING {MAPPING_COLUMNS}"
        );
        let mapping = sqlx::query_as::<_, ChannelMapping>(&sql)
            .bind(product_id)
            .bind(platform.as_str())
            .bind(&input.external_id)
            .bind(&input.external_variant_id)
            .bind(input.sync_status.as_str())
            .bind(&input.error_message)
            .bind(&input.sync_data)
            .fetch_one(pool)
            .await?;
        Ok(mapping)
    }

    /// Find the mapping for one `(product, platform)` pair.
    pub async fn find(
        pool: &PgPool,
        product_id: DbId,
        platform: Platform,
    ) -> Result<Option<ChannelMapping>, sqlx::Error> {
        let sql = format!(
            "SELECT {MAPPING_COLUMNS} FROM channel_mappings \
             WHERE product_id = $1 AND platform = $2"
        );
        sqlx::query_as::<_, ChannelMapping>(&sql)
            .bind(product_id)
            .bind(platform.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Count mappings for a platform by status (import progress input).
    pub async fn count_by_status(
        pool: &PgPool,
        platform: Platform,
        status: SyncStatus,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM channel_mappings WHERE platform = $1 AND sync_status = $2",
        )
        .bind(platform.as_str())
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Recent error messages for a platform, newest first.
    pub async fn recent_errors(
        pool: &PgPool,
        platform: Platform,
        limit: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT error_message FROM channel_mappings \
             WHERE platform = $1 AND sync_status = 'error' AND error_message IS NOT NULL \
             ORDER BY updated_at DESC LIMIT $2",
        )
        .bind(platform.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(m,)| m).collect())
    }

    /// Drop the mapping when the owning product or connection goes away.
    pub async fn delete_for_product(
        pool: &PgPool,
        product_id: DbId,
        platform: Platform,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM channel_mappings WHERE product_id = $1 AND platform = $2")
                .bind(product_id)
                .bind(platform.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
