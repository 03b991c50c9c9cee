//! Repository for platform connections.

use catsync_core::platform::Platform;
use catsync_core::types::DbId;
use sqlx::PgPool;

use crate::models::connection::{PlatformConnection, UpsertConnection};

/// Column list for `platform_connections`.
const CONNECTION_COLUMNS: &str = "id, user_id, platform, display_name, credentials, configuration, \
     is_active, last_connected, created_at, updated_at";

/// Provides CRUD operations for platform connections.
pub struct ConnectionRepo;

impl ConnectionRepo {
    /// Insert or refresh a connection for `(user, platform, shop)`.
    ///
    /// A reconnection overwrites the credential blob, reactivates the
    /// row, and bumps `last_connected`.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertConnection,
    ) -> Result<PlatformConnection, sqlx::Error> {
        let sql = format!(
            "INSERT INTO platform_connections \
                (user_id, platform, display_name, credentials, configuration) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, platform, display_name) DO UPDATE SET \
                credentials = EXCLUDED.credentials, \
                configuration = COALESCE(EXCLUDED.configuration, platform_connections.configuration), \
                is_active = TRUE, \
                last_connected = now(), \
                updated_at = now() \
             RETURNING {CONNECTION_COLUMNS}"
        );
        sqlx::query_as::<_, PlatformConnection>(&sql)
            .bind(&input.user_id)
            .bind(input.platform.as_str())
            .bind(&input.display_name)
            .bind(&input.credentials)
            .bind(&input.configuration)
            .fetch_one(pool)
            .await
    }

    /// List active connections for a platform, most recently connected
    /// first.
    ///
    /// The ordering is what makes "pick index 0 when no explicit
    /// connection id is supplied" deterministic.
    pub async fn list_active(
        pool: &PgPool,
        platform: Platform,
    ) -> Result<Vec<PlatformConnection>, sqlx::Error> {
        let sql = format!(
            "SELECT {CONNECTION_COLUMNS} FROM platform_connections \
             WHERE platform = $1 AND is_active = TRUE \
             ORDER BY last_connected DESC, id DESC"
        );
        sqlx::query_as::<_, PlatformConnection>(&sql)
            .bind(platform.as_str())
            .fetch_all(pool)
            .await
    }

    /// Find a connection by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PlatformConnection>, sqlx::Error> {
        let sql = format!("SELECT {CONNECTION_COLUMNS} FROM platform_connections WHERE id = $1");
        sqlx::query_as::<_, PlatformConnection>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Refresh `last_connected` after a successful probe.
    pub async fn touch_last_connected(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE platform_connections SET last_connected = now(), updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Deactivate a connection without losing its history.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE platform_connections SET is_active = FALSE, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a connection row outright.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM platform_connections WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
