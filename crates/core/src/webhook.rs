//! Signature verification for identity-provider lifecycle webhooks.
//!
//! Deliveries carry three required headers (`webhook-id`,
//! `webhook-timestamp`, `webhook-signature`). The signature is an
//! HMAC-SHA256 over `"{id}.{timestamp}.{payload}"`, base64 encoded and
//! prefixed with a version tag (`v1,`). Any missing header or mismatch
//! rejects the whole delivery with no partial processing.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CoreError;

type HmacSha256 = Hmac<Sha256>;

/// Optional prefix on webhook secrets as issued by the provider.
const SECRET_PREFIX: &str = "whsec_";

/// The three raw header values of one delivery.
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    /// Collect headers from optional lookups, rejecting if any is absent.
    pub fn require(
        id: Option<&str>,
        timestamp: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Self, CoreError> {
        match (id, timestamp, signature) {
            (Some(id), Some(ts), Some(sig)) => Ok(Self {
                id: id.to_string(),
                timestamp: ts.to_string(),
                signature: sig.to_string(),
            }),
            _ => Err(CoreError::Unauthorized(
                "Missing webhook signature headers".to_string(),
            )),
        }
    }
}

/// Verify a webhook delivery against the shared secret.
///
/// The signature header may list several space-separated candidates
/// (`v1,abc v1,def`); verification succeeds if any of them matches.
pub fn verify_signature(
    secret: &str,
    headers: &WebhookHeaders,
    payload: &[u8],
) -> Result<(), CoreError> {
    let key = decode_secret(secret)?;

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|_| CoreError::Internal("Invalid webhook secret length".to_string()))?;
    mac.update(headers.id.as_bytes());
    mac.update(b".");
    mac.update(headers.timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    for candidate in headers.signature.split(' ') {
        let encoded = candidate.strip_prefix("v1,").unwrap_or(candidate);
        let Ok(sig) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
            continue;
        };
        // verify_slice is constant-time; clone because verification consumes.
        if mac.clone().verify_slice(&sig).is_ok() {
            return Ok(());
        }
    }

    Err(CoreError::Unauthorized(
        "Webhook signature mismatch".to_string(),
    ))
}

/// Decode a `whsec_`-prefixed base64 secret into raw key bytes.
fn decode_secret(secret: &str) -> Result<Vec<u8>, CoreError> {
    let trimmed = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|_| CoreError::Internal("Webhook secret is not valid base64".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "whsec_C2FVsBQIhrscChlQIMV+b5sSYspob7oD";

    fn sign(id: &str, timestamp: &str, payload: &[u8]) -> String {
        let key = decode_secret(SECRET).unwrap();
        let mut mac = HmacSha256::new_from_slice(&key).unwrap();
        mac.update(format!("{id}.{timestamp}.").as_bytes());
        mac.update(payload);
        let sig = mac.finalize().into_bytes();
        format!(
            "v1,{}",
            base64::engine::general_purpose::STANDARD.encode(sig)
        )
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"type":"user.created","data":{"id":"user_1"}}"#;
        let headers = WebhookHeaders {
            id: "msg_1".into(),
            timestamp: "1700000000".into(),
            signature: sign("msg_1", "1700000000", payload),
        };
        assert!(verify_signature(SECRET, &headers, payload).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = br#"{"type":"user.created"}"#;
        let headers = WebhookHeaders {
            id: "msg_1".into(),
            timestamp: "1700000000".into(),
            signature: sign("msg_1", "1700000000", payload),
        };
        let tampered = br#"{"type":"user.deleted"}"#;
        assert_matches!(
            verify_signature(SECRET, &headers, tampered),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn test_multiple_candidates_any_match() {
        let payload = b"body";
        let good = sign("msg_2", "1700000001", payload);
        let headers = WebhookHeaders {
            id: "msg_2".into(),
            timestamp: "1700000001".into(),
            signature: format!("v1,bm90YXNpZw== {good}"),
        };
        assert!(verify_signature(SECRET, &headers, payload).is_ok());
    }

    #[test]
    fn test_missing_headers_rejected() {
        assert_matches!(
            WebhookHeaders::require(Some("id"), None, Some("sig")),
            Err(CoreError::Unauthorized(_))
        );
    }
}
