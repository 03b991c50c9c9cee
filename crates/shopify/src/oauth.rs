//! OAuth authorization-code flow against a Shopify store.
//!
//! The exchange is two calls: POST the code to the token endpoint, then
//! probe the Admin API with the fresh token. A token that fails the
//! probe is discarded, never persisted.

use serde::Deserialize;

use crate::config::{ShopifyConfig, API_VERSION};

/// Errors from the credential exchange.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The token endpoint answered with a non-2xx status.
    #[error("Token exchange failed ({status}): {body}")]
    TokenExchangeFailed { status: u16, body: String },

    /// The fresh token failed the connectivity probe.
    #[error("Connection test failed: {0}")]
    ConnectionTestFailed(String),

    /// The shop identifier is not a plausible `*.myshopify.com` domain.
    #[error("Invalid shop domain: '{0}'")]
    InvalidShopDomain(String),
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub scope: String,
}

/// Basic shop metadata from the probe call.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShopEnvelope {
    shop: ShopInfo,
}

/// Performs the OAuth exchange for one configured app.
pub struct ShopifyOAuth {
    client: reqwest::Client,
    config: ShopifyConfig,
}

impl ShopifyOAuth {
    pub fn new(config: ShopifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn with_client(client: reqwest::Client, config: ShopifyConfig) -> Self {
        Self { client, config }
    }

    /// Build the authorize redirect URL for a shop and caller-issued state.
    pub fn build_authorize_url(&self, shop_domain: &str, state: &str) -> String {
        format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop_domain,
            urlencode(&self.config.api_key),
            urlencode(&self.config.scopes),
            urlencode(&self.config.redirect_uri),
            urlencode(state),
        )
    }

    /// Exchange an authorization code for an access token, then probe.
    ///
    /// Returns the token and the probed shop metadata. Any non-2xx from
    /// the token endpoint is `TokenExchangeFailed`; a token that cannot
    /// fetch `shop.json` is `ConnectionTestFailed` and is dropped.
    pub async fn exchange_code_for_token(
        &self,
        shop_domain: &str,
        code: &str,
    ) -> Result<(AccessTokenResponse, ShopInfo), ExchangeError> {
        validate_shop_domain(shop_domain)?;

        let url = format!("https://{shop_domain}/admin/oauth/access_token");
        let body = serde_json::json!({
            "client_id": self.config.api_key,
            "client_secret": self.config.api_secret,
            "code": code,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ExchangeError::TokenExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }
        let token: AccessTokenResponse = response.json().await?;

        let shop = self.probe(shop_domain, &token.access_token).await?;

        tracing::info!(
            shop = %shop_domain,
            scope = %token.scope,
            "OAuth exchange and probe succeeded"
        );

        Ok((token, shop))
    }

    /// Fetch basic shop metadata to confirm the token is usable.
    pub async fn probe(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<ShopInfo, ExchangeError> {
        let url = format!("https://{shop_domain}/admin/api/{API_VERSION}/shop.json");
        let response = self
            .client
            .get(&url)
            .header("X-Shopify-Access-Token", access_token)
            .send()
            .await
            .map_err(|e| ExchangeError::ConnectionTestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::ConnectionTestFailed(format!(
                "shop.json returned {status}"
            )));
        }

        let envelope: ShopEnvelope = response
            .json()
            .await
            .map_err(|e| ExchangeError::ConnectionTestFailed(e.to_string()))?;
        Ok(envelope.shop)
    }
}

/// Sanity-check a shop identifier before building URLs from it.
pub fn validate_shop_domain(shop_domain: &str) -> Result<(), ExchangeError> {
    let ok = shop_domain.ends_with(".myshopify.com")
        && !shop_domain.contains('/')
        && shop_domain.len() > ".myshopify.com".len();
    if ok {
        Ok(())
    } else {
        Err(ExchangeError::InvalidShopDomain(shop_domain.to_string()))
    }
}

/// Minimal percent-encoding for query string values.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config() -> ShopifyConfig {
        ShopifyConfig {
            api_key: "key123".into(),
            api_secret: "secret".into(),
            scopes: "read_products,write_products".into(),
            redirect_uri: "http://localhost:3000/oauth/callback".into(),
        }
    }

    #[test]
    fn test_authorize_url_shape() {
        let oauth = ShopifyOAuth::new(config());
        let url = oauth.build_authorize_url("demo.myshopify.com", "user-1-1700000000000");
        assert!(url.starts_with("https://demo.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=key123"));
        assert!(url.contains("scope=read_products%2Cwrite_products"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Foauth%2Fcallback"));
        assert!(url.contains("state=user-1-1700000000000"));
    }

    #[test]
    fn test_shop_domain_validation() {
        assert!(validate_shop_domain("demo.myshopify.com").is_ok());
        assert_matches!(
            validate_shop_domain("demo.example.com"),
            Err(ExchangeError::InvalidShopDomain(_))
        );
        assert_matches!(
            validate_shop_domain(".myshopify.com"),
            Err(ExchangeError::InvalidShopDomain(_))
        );
        assert_matches!(
            validate_shop_domain("evil.com/x.myshopify.com"),
            Err(ExchangeError::InvalidShopDomain(_))
        );
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("a b,c"), "a%20b%2Cc");
        assert_eq!(urlencode("safe-._~"), "safe-._~");
    }
}
