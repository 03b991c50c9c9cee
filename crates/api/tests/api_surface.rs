//! HTTP surface tests that run without a live database.
//!
//! The pool is created lazily and never connected; only routes whose
//! handlers stay out of the database (or tolerate it being down, like
//! the health check) are exercised here.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine as _;
use catsync_api::config::ServerConfig;
use catsync_api::router::build_app_router;
use catsync_api::state::AppState;
use catsync_core::platform::Platform;
use catsync_shopify::oauth::ShopifyOAuth;
use catsync_shopify::ShopifyConfig;
use catsync_sync::{ImportOrchestrator, ProductSyncEngine};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use sha2::Sha256;
use tower::ServiceExt;

const WEBHOOK_SECRET: &str = "whsec_C2FVsBQIhrscChlQIMV+b5sSYspob7oD";

fn test_config(webhook_secret: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 5,
        webhook_secret: webhook_secret.map(String::from),
    }
}

fn test_app(webhook_secret: Option<&str>) -> Router {
    let pool = catsync_db::DbPool::connect_lazy("postgres://localhost/catsync_test").unwrap();
    let config = test_config(webhook_secret);
    let shopify_config = ShopifyConfig {
        api_key: "test-key".into(),
        api_secret: "test-secret".into(),
        scopes: "read_products,write_products".into(),
        redirect_uri: "http://localhost:3000/oauth/callback".into(),
    };
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        oauth: Arc::new(ShopifyOAuth::new(shopify_config)),
        engine: Arc::new(ProductSyncEngine::new(pool.clone(), Platform::Shopify)),
        orchestrator: ImportOrchestrator::new(pool, Platform::Shopify),
    };
    build_app_router(state, &config)
}

fn sign(id: &str, timestamp: &str, payload: &[u8]) -> String {
    let key = base64::engine::general_purpose::STANDARD
        .decode(WEBHOOK_SECRET.trim_start_matches("whsec_"))
        .unwrap();
    let mut mac = Hmac::<Sha256>::new_from_slice(&key).unwrap();
    mac.update(format!("{id}.{timestamp}.").as_bytes());
    mac.update(payload);
    let sig = mac.finalize().into_bytes();
    format!(
        "v1,{}",
        base64::engine::general_purpose::STANDARD.encode(sig)
    )
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = test_app(None);
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
}

#[tokio::test]
async fn test_webhook_rejected_when_unconfigured() {
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::post("/api/v1/webhooks/identity")
                .header("webhook-id", "msg_1")
                .header("webhook-timestamp", "1700000000")
                .header("webhook-signature", "v1,Zm9v")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_webhook_valid_signature_accepted() {
    let payload = br#"{"type":"user.updated"}"#;
    let signature = sign("msg_1", "1700000000", payload);

    let app = test_app(Some(WEBHOOK_SECRET));
    let response = app
        .oneshot(
            Request::post("/api/v1/webhooks/identity")
                .header("webhook-id", "msg_1")
                .header("webhook-timestamp", "1700000000")
                .header("webhook-signature", signature)
                .body(Body::from(&payload[..]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_webhook_tampered_payload_rejected() {
    let signature = sign("msg_1", "1700000000", br#"{"type":"user.updated"}"#);

    let app = test_app(Some(WEBHOOK_SECRET));
    let response = app
        .oneshot(
            Request::post("/api/v1/webhooks/identity")
                .header("webhook-id", "msg_1")
                .header("webhook-timestamp", "1700000000")
                .header("webhook-signature", signature)
                .body(Body::from(r#"{"type":"user.deleted"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_missing_headers_rejected() {
    let app = test_app(Some(WEBHOOK_SECRET));
    let response = app
        .oneshot(
            Request::post("/api/v1/webhooks/identity")
                .header("webhook-id", "msg_1")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authorize_requires_user_identity() {
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::get("/api/v1/oauth/shopify/authorize?shop=my-store.myshopify.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authorize_returns_url_and_state() {
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::get("/api/v1/oauth/shopify/authorize?shop=my-store.myshopify.com")
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let url = json["data"]["authorize_url"].as_str().unwrap();
    assert!(url.starts_with("https://my-store.myshopify.com/admin/oauth/authorize"));
    let state = json["data"]["state"].as_str().unwrap();
    assert!(state.starts_with("user-1-"));
}

#[tokio::test]
async fn test_authorize_rejects_bad_shop_domain() {
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::get("/api/v1/oauth/shopify/authorize?shop=evil.example.com")
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_SHOP_DOMAIN");
}

#[tokio::test]
async fn test_callback_rejects_stale_state() {
    // Minted far in the past, beyond the freshness window.
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::get(
                "/api/v1/oauth/shopify/callback?code=abc&shop=my-store.myshopify.com&state=user-1-1000",
            )
            .header("x-user-id", "user-1")
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_callback_rejects_mismatched_identity() {
    let state_token = format!("user-2-{}", chrono::Utc::now().timestamp_millis());
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::get(format!(
                "/api/v1/oauth/shopify/callback?code=abc&shop=my-store.myshopify.com&state={state_token}"
            ))
            .header("x-user-id", "user-1")
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_batch_sync_rejects_empty_input() {
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::post("/api/v1/sync/batch")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"product_ids": [], "operation": "update"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_batch_sync_rejects_bulk_import_operation() {
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::post("/api/v1/sync/batch")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"product_ids": [1, 2], "operation": "bulk_import"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_unknown_import_reports_false() {
    let app = test_app(None);
    let response = app
        .oneshot(
            Request::post("/api/v1/import/shopify-12345/cancel")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["cancelled"], false);
}
