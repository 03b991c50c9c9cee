//! Repository for local catalog products.

use catsync_core::types::DbId;
use sqlx::PgPool;

use crate::models::product::{ImportedProduct, Product};

/// Column list for `products`.
const PRODUCT_COLUMNS: &str = "id, title, description, vendor, product_type, tags, status, price, \
     sku, inventory_count, weight_grams, image_urls, external_source, \
     created_at, updated_at";

/// Read and import-upsert operations for products. Authoring CRUD lives
/// in the admin UI's own backend and is out of scope here.
pub struct ProductRepo;

impl ProductRepo {
    /// Find a product by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Total product count (import progress denominator).
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Upsert a remote product by its external source identity.
    ///
    /// Bulk imports call this once per remote product; re-running an
    /// import updates rows in place rather than duplicating them.
    pub async fn upsert_imported(
        pool: &PgPool,
        input: &ImportedProduct,
    ) -> Result<Product, sqlx::Error> {
        let sql = format!(
            "INSERT INTO products \
                (title, description, vendor, product_type, tags, status, price, sku, \
                 inventory_count, image_urls, external_source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (external_source) WHERE external_source IS NOT NULL DO UPDATE SET \
                title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                vendor = EXCLUDED.vendor, \
                product_type = EXCLUDED.product_type, \
                tags = EXCLUDED.tags, \
                status = EXCLUDED.status, \
                price = EXCLUDED.price, \
                sku = EXCLUDED.sku, \
                inventory_count = EXCLUDED.inventory_count, \
                image_urls = EXCLUDED.image_urls, \
                updated_at = now() \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.vendor)
            .bind(&input.product_type)
            .bind(&input.tags)
            .bind(&input.status)
            .bind(&input.price)
            .bind(&input.sku)
            .bind(input.inventory_count)
            .bind(&input.image_urls)
            .bind(&input.external_source)
            .fetch_one(pool)
            .await
    }
}
