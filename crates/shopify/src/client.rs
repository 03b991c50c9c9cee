//! Authenticated GraphQL client for one Shopify store.

use serde::de::DeserializeOwned;

use crate::config::API_VERSION;
use crate::graphql::{LocationsData, PRIMARY_LOCATION};

/// Errors from the Shopify API layer.
#[derive(Debug, thiserror::Error)]
pub enum ShopifyApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Shopify returned a non-2xx status code.
    #[error("Shopify API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The GraphQL layer reported top-level errors.
    #[error("GraphQL error: {0}")]
    Graphql(String),

    /// A mutation's `userErrors` list was non-empty.
    #[error("Shopify rejected the payload: {0}")]
    UserErrors(String),

    /// The response body did not match the expected shape.
    #[error("Malformed Shopify response: {0}")]
    Malformed(String),
}

/// GraphQL client bound to one shop and access token.
pub struct ShopifyClient {
    client: reqwest::Client,
    shop_domain: String,
    access_token: String,
}

impl ShopifyClient {
    /// Create a client for a shop.
    ///
    /// * `shop_domain` - fully qualified, e.g. `my-store.myshopify.com`.
    /// * `access_token` - Admin API token from the OAuth exchange.
    pub fn new(shop_domain: String, access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            shop_domain,
            access_token,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (connection pooling across shops).
    pub fn with_client(client: reqwest::Client, shop_domain: String, access_token: String) -> Self {
        Self {
            client,
            shop_domain,
            access_token,
        }
    }

    pub fn shop_domain(&self) -> &str {
        &self.shop_domain
    }

    /// Execute a GraphQL document and deserialize the `data` payload.
    ///
    /// Top-level `errors` are collapsed into
    /// [`ShopifyApiError::Graphql`]; mutation-level `userErrors` are the
    /// caller's responsibility (see [`check_user_errors`]).
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyApiError> {
        let url = format!(
            "https://{}/admin/api/{}/graphql.json",
            self.shop_domain, API_VERSION
        );
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .client
            .post(&url)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&body)
            .send()
            .await?;

        let envelope: serde_json::Value = Self::parse_response(response).await?;

        if let Some(errors) = envelope.get("errors").filter(|e| !e.is_null()) {
            let joined = collect_messages(errors);
            return Err(ShopifyApiError::Graphql(joined));
        }

        let data = envelope
            .get("data")
            .cloned()
            .ok_or_else(|| ShopifyApiError::Malformed("response has no data field".into()))?;
        serde_json::from_value(data).map_err(|e| ShopifyApiError::Malformed(e.to_string()))
    }

    /// Id of the shop's first location, the target for pushed inventory
    /// quantities. `None` for shops with no locations at all.
    pub async fn primary_location_id(&self) -> Result<Option<String>, ShopifyApiError> {
        let data: LocationsData = self
            .graphql(PRIMARY_LOCATION, serde_json::json!({}))
            .await?;
        Ok(data.locations.edges.first().map(|e| e.node.id.clone()))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, then parse JSON.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShopifyApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ShopifyApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Fail if a mutation payload's `userErrors` list is non-empty.
///
/// Every Shopify mutation returns `userErrors`; the payload must not be
/// trusted before this check.
pub fn check_user_errors(user_errors: &[UserError]) -> Result<(), ShopifyApiError> {
    if user_errors.is_empty() {
        return Ok(());
    }
    let joined = user_errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(ShopifyApiError::UserErrors(joined))
}

/// One entry of a mutation's `userErrors` list.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Flatten a GraphQL `errors` value into one message string.
fn collect_messages(errors: &serde_json::Value) -> String {
    match errors.as_array() {
        Some(list) => list
            .iter()
            .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        None => errors.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_check_user_errors_empty_ok() {
        assert!(check_user_errors(&[]).is_ok());
    }

    #[test]
    fn test_check_user_errors_joins_messages() {
        let errors = vec![
            UserError {
                field: Some(vec!["title".into()]),
                message: "Title can't be blank".into(),
            },
            UserError {
                field: None,
                message: "Price is invalid".into(),
            },
        ];
        let err = check_user_errors(&errors).unwrap_err();
        assert_matches!(err, ShopifyApiError::UserErrors(msg) => {
            assert!(msg.contains("Title can't be blank"));
            assert!(msg.contains("Price is invalid"));
        });
    }

    #[test]
    fn test_collect_messages() {
        let errors = serde_json::json!([
            {"message": "Throttled"},
            {"message": "Internal error"}
        ]);
        assert_eq!(collect_messages(&errors), "Throttled; Internal error");
    }
}
