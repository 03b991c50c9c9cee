//! Handler for inbound identity-provider webhook deliveries.
//!
//! Deliveries are signed with `HMAC-SHA256` over
//! `{id}.{timestamp}.{payload}` under a `whsec_`-prefixed base64 secret,
//! carried in the `webhook-id` / `webhook-timestamp` / `webhook-signature`
//! headers. Verification happens against the raw body bytes, before any
//! JSON parsing.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use catsync_core::error::CoreError;
use catsync_core::webhook::{verify_signature, WebhookHeaders};

use crate::error::AppResult;
use crate::state::AppState;

/// POST /api/v1/webhooks/identity
///
/// Verify the delivery signature and acknowledge. User lifecycle events
/// are fire-and-forget: a 2xx tells the sender not to retry.
pub async fn receive_identity_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<StatusCode> {
    let secret = state.config.webhook_secret.as_deref().ok_or_else(|| {
        CoreError::Unauthorized("Webhook verification is not configured".to_string())
    })?;

    let delivery = WebhookHeaders::require(
        header_str(&headers, "webhook-id"),
        header_str(&headers, "webhook-timestamp"),
        header_str(&headers, "webhook-signature"),
    )?;
    verify_signature(secret, &delivery, &body)?;

    let event_type = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(String::from))
        .unwrap_or_else(|| "unknown".to_string());
    tracing::info!(
        delivery_id = %delivery.id,
        event_type = %event_type,
        bytes = body.len(),
        "Webhook delivery accepted"
    );

    Ok(StatusCode::NO_CONTENT)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
