//! Shopify app configuration loaded from environment variables.

/// Admin API version used for every call.
pub const API_VERSION: &str = "2024-10";

/// OAuth scopes requested during installation.
pub const DEFAULT_SCOPES: &str = "read_products,write_products";

/// App credentials and OAuth settings.
///
/// | Env Var                 | Default                                  |
/// |-------------------------|------------------------------------------|
/// | `SHOPIFY_API_KEY`       | (required)                               |
/// | `SHOPIFY_API_SECRET`    | (required)                               |
/// | `SHOPIFY_SCOPES`        | `read_products,write_products`           |
/// | `SHOPIFY_REDIRECT_URI`  | `http://localhost:3000/oauth/callback`   |
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    pub api_key: String,
    pub api_secret: String,
    pub scopes: String,
    pub redirect_uri: String,
}

impl ShopifyConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("SHOPIFY_API_KEY").expect("SHOPIFY_API_KEY must be set");
        let api_secret =
            std::env::var("SHOPIFY_API_SECRET").expect("SHOPIFY_API_SECRET must be set");
        let scopes =
            std::env::var("SHOPIFY_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string());
        let redirect_uri = std::env::var("SHOPIFY_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:3000/oauth/callback".to_string());

        Self {
            api_key,
            api_secret,
            scopes,
            redirect_uri,
        }
    }
}
