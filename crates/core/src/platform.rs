//! Platform identity and typed credential blobs.
//!
//! Connections store a platform-specific credential blob as JSONB. It is
//! decoded into [`PlatformCredential`] at the store boundary so the rest
//! of the system never handles untyped maps.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How many characters of an access token may appear in diagnostics.
const TOKEN_REDACT_PREFIX_LEN: usize = 6;

/// A remote commerce platform a local product can be synchronized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shopify,
}

impl Platform {
    /// Stable lowercase name, used as the database value and in import ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Shopify => "shopify",
        }
    }

    /// Parse a database value back into a platform.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "shopify" => Ok(Platform::Shopify),
            other => Err(CoreError::Validation(format!(
                "Unknown platform: '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed credential union, tagged by platform.
///
/// Serialized form carries a `platform` tag so future platforms can add
/// variants without a schema change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum PlatformCredential {
    Shopify(ShopifyCredentials),
}

/// Credentials for one Shopify store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyCredentials {
    /// Admin API access token obtained from the OAuth code exchange.
    pub access_token: String,
    /// Fully qualified shop domain, e.g. `my-store.myshopify.com`.
    pub shop_domain: String,
    /// Scope string granted by the platform, comma-separated.
    pub scope: String,
}

impl PlatformCredential {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformCredential::Shopify(_) => Platform::Shopify,
        }
    }

    /// Whether the credential carries enough material to make API calls.
    pub fn is_usable(&self) -> bool {
        match self {
            PlatformCredential::Shopify(c) => {
                !c.access_token.is_empty() && !c.shop_domain.is_empty()
            }
        }
    }

    /// Redacted token prefix safe for logs.
    ///
    /// Full tokens must never appear in diagnostics; only this prefix may.
    pub fn redacted_token(&self) -> String {
        let token = match self {
            PlatformCredential::Shopify(c) => &c.access_token,
        };
        let prefix: String = token.chars().take(TOKEN_REDACT_PREFIX_LEN).collect();
        format!("{prefix}…")
    }

    /// Decode a JSONB credential blob into the typed union.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Malformed credential blob: {e}")))
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Serialization of a tagged enum over plain structs cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Per-connection sync feature flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub auto_sync: bool,
    pub sync_inventory: bool,
    pub sync_prices: bool,
    pub sync_images: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            auto_sync: false,
            sync_inventory: true,
            sync_prices: true,
            sync_images: true,
        }
    }
}

impl ConnectionConfig {
    /// Decode a JSONB configuration blob, falling back to defaults for a
    /// missing or null blob.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone()).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_roundtrip() {
        assert_eq!(Platform::parse("shopify").unwrap(), Platform::Shopify);
        assert_eq!(Platform::Shopify.as_str(), "shopify");
        assert!(Platform::parse("amazon").is_err());
    }

    #[test]
    fn test_credential_json_roundtrip() {
        let cred = PlatformCredential::Shopify(ShopifyCredentials {
            access_token: "shpat_abcdef123456".into(),
            shop_domain: "demo.myshopify.com".into(),
            scope: "read_products,write_products".into(),
        });
        let json = cred.to_json();
        assert_eq!(json["platform"], "shopify");
        let back = PlatformCredential::from_json(&json).unwrap();
        assert!(back.is_usable());
        assert_eq!(back.platform(), Platform::Shopify);
    }

    #[test]
    fn test_redacted_token_never_leaks_full_value() {
        let cred = PlatformCredential::Shopify(ShopifyCredentials {
            access_token: "shpat_supersecretvalue".into(),
            shop_domain: "demo.myshopify.com".into(),
            scope: String::new(),
        });
        let redacted = cred.redacted_token();
        assert!(redacted.starts_with("shpat_"));
        assert!(!redacted.contains("supersecret"));
    }

    #[test]
    fn test_empty_token_is_not_usable() {
        let cred = PlatformCredential::Shopify(ShopifyCredentials {
            access_token: String::new(),
            shop_domain: "demo.myshopify.com".into(),
            scope: String::new(),
        });
        assert!(!cred.is_usable());
    }

    #[test]
    fn test_config_defaults_on_missing_blob() {
        let config = ConnectionConfig::from_json(None);
        assert!(config.sync_images);
        assert!(!config.auto_sync);
    }
}
