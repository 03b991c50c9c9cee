//! Models for local catalog products.

use catsync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub tags: Vec<String>,
    /// Local status; `active` maps to the platform's ACTIVE, everything
    /// else publishes as DRAFT.
    pub status: String,
    /// Decimal string as the platform API expects it (`"19.99"`).
    pub price: Option<String>,
    pub sku: Option<String>,
    pub inventory_count: i32,
    pub weight_grams: Option<i32>,
    pub image_urls: Vec<String>,
    /// Source identity for imported rows, `{platform}:{external_id}`.
    pub external_source: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for upserting a product pulled from a remote platform during a
/// bulk import. Keyed by `external_source`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportedProduct {
    pub title: String,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub price: Option<String>,
    pub sku: Option<String>,
    pub inventory_count: i32,
    pub image_urls: Vec<String>,
    pub external_source: String,
}
