//! GraphQL documents and typed payloads for the Admin API.
//!
//! Every mutation payload carries a `userErrors` list that must be
//! checked (via [`crate::client::check_user_errors`]) before the rest of
//! the payload is trusted.

use serde::{Deserialize, Serialize};

use crate::client::UserError;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub const STAGED_UPLOADS_CREATE: &str = r#"
mutation stagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets {
      url
      resourceUrl
      parameters { name value }
    }
    userErrors { field message }
  }
}
"#;

pub const PRODUCT_CREATE: &str = r#"
mutation productCreate($input: ProductInput!, $media: [CreateMediaInput!]) {
  productCreate(input: $input, media: $media) {
    product {
      id
      title
      handle
      variants(first: 1) { edges { node { id } } }
    }
    userErrors { field message }
  }
}
"#;

pub const PRODUCT_UPDATE: &str = r#"
mutation productUpdate($input: ProductInput!, $media: [CreateMediaInput!]) {
  productUpdate(input: $input, media: $media) {
    product {
      id
      title
      handle
      variants(first: 1) { edges { node { id } } }
    }
    userErrors { field message }
  }
}
"#;

pub const PRODUCT_DELETE: &str = r#"
mutation productDelete($input: ProductDeleteInput!) {
  productDelete(input: $input) {
    deletedProductId
    userErrors { field message }
  }
}
"#;

pub const PRIMARY_LOCATION: &str = r#"
query primaryLocation {
  locations(first: 1) {
    edges { node { id } }
  }
}
"#;

pub const PRODUCTS_PAGE: &str = r#"
query products($first: Int!, $after: String) {
  products(first: $first, after: $after) {
    edges {
      node {
        id
        title
        descriptionHtml
        vendor
        productType
        tags
        status
        images(first: 10) { edges { node { url } } }
        variants(first: 1) {
          edges { node { id sku price inventoryQuantity } }
        }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

// ---------------------------------------------------------------------------
// Input shapes
// ---------------------------------------------------------------------------

/// `ProductInput` for create/update mutations.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Comma-joined tag list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// `ACTIVE` or `DRAFT`.
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantInput>,
}

/// Single default variant carrying price/inventory/sku/weight.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_quantities: Option<Vec<InventoryQuantityInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<String>,
}

/// `InventoryLevelInput`: available quantity at one location.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuantityInput {
    pub available_quantity: i32,
    pub location_id: String,
}

/// `CreateMediaInput` referencing a staged upload's resource URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaInput {
    pub original_source: String,
    pub media_content_type: String,
}

/// `StagedUploadInput` for the staging mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadInput {
    pub resource: String,
    pub filename: String,
    pub mime_type: String,
    pub http_method: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StagedUploadsCreateData {
    #[serde(rename = "stagedUploadsCreate")]
    pub staged_uploads_create: StagedUploadsCreatePayload,
}

#[derive(Debug, Deserialize)]
pub struct StagedUploadsCreatePayload {
    #[serde(rename = "stagedTargets", default)]
    pub staged_targets: Vec<StagedTarget>,
    #[serde(rename = "userErrors", default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StagedTarget {
    pub url: String,
    #[serde(rename = "resourceUrl")]
    pub resource_url: String,
    #[serde(default)]
    pub parameters: Vec<StagedParameterRaw>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StagedParameterRaw {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductCreateData {
    #[serde(rename = "productCreate")]
    pub product_create: ProductMutationPayload,
}

#[derive(Debug, Deserialize)]
pub struct ProductUpdateData {
    #[serde(rename = "productUpdate")]
    pub product_update: ProductMutationPayload,
}

#[derive(Debug, Deserialize)]
pub struct ProductMutationPayload {
    pub product: Option<RemoteProduct>,
    #[serde(rename = "userErrors", default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub struct ProductDeleteData {
    #[serde(rename = "productDelete")]
    pub product_delete: ProductDeletePayload,
}

#[derive(Debug, Deserialize)]
pub struct ProductDeletePayload {
    #[serde(rename = "deletedProductId")]
    pub deleted_product_id: Option<String>,
    #[serde(rename = "userErrors", default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub variants: Option<Connection<RemoteVariant>>,
}

impl RemoteProduct {
    /// Id of the first (default) variant, when the query selected any.
    pub fn first_variant_id(&self) -> Option<String> {
        self.variants
            .as_ref()?
            .edges
            .first()
            .map(|e| e.node.id.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteVariant {
    pub id: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(rename = "inventoryQuantity", default)]
    pub inventory_quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LocationsData {
    pub locations: Connection<RemoteLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteLocation {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductsPageData {
    pub products: ProductsConnection,
}

#[derive(Debug, Deserialize)]
pub struct ProductsConnection {
    #[serde(default)]
    pub edges: Vec<Edge<ListedProduct>>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListedProduct {
    pub id: String,
    pub title: String,
    #[serde(rename = "descriptionHtml", default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(rename = "productType", default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub images: Option<Connection<RemoteImage>>,
    #[serde(default)]
    pub variants: Option<Connection<RemoteVariant>>,
}

impl ListedProduct {
    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .as_ref()
            .map(|c| c.edges.iter().map(|e| e.node.url.clone()).collect())
            .unwrap_or_default()
    }

    pub fn first_variant(&self) -> Option<&RemoteVariant> {
        self.variants.as_ref()?.edges.first().map(|e| &e.node)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteImage {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor", default)]
    pub end_cursor: Option<String>,
}
