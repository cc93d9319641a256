//! Handler-level tests using tower::ServiceExt::oneshot.
//!
//! Tests the full Axum router (middleware + handlers) without binding a
//! TCP listener.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use thumbrate::config::{Config, ProviderType};
use thumbrate::server::build_router;
use tower::ServiceExt;
use url::Url;

/// Build a test config with sensible defaults: static provider, so no
/// handler test ever touches the network.
fn test_config() -> Config {
    Config {
        port: 0,
        is_dev: true,
        api_endpoint: Url::parse("https://api.invalid/videos").unwrap(),
        api_key: Some("static".to_string()),
        cache_duration: std::time::Duration::from_secs(600),
        batch_window: std::time::Duration::from_millis(10),
        chunk_size: 50,
        provider_type: ProviderType::Static,
    }
}

/// Same, but a keyless YouTube-provider host: every lookup degrades to null.
fn keyless_config() -> Config {
    Config {
        api_key: None,
        provider_type: ProviderType::YouTube,
        ..test_config()
    }
}

fn post_message(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── Health endpoint ─────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_200_with_json() {
    let app = build_router(test_config()).await;

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_seconds"].is_number());
    assert!(json["cached_videos"].is_number());
}

// ── Version header ──────────────────────────────────────────────────────────

#[tokio::test]
async fn all_responses_include_version_header() {
    let app = build_router(test_config()).await;

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let version = resp
        .headers()
        .get("x-thumbrate-version")
        .expect("missing X-Thumbrate-Version header");

    assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
}

// ── 404 for unknown routes ──────────────────────────────────────────────────

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_router(test_config()).await;

    let req = Request::builder()
        .uri("/nonexistent")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Message protocol ────────────────────────────────────────────────────────

#[tokio::test]
async fn get_stats_answers_stats_object() {
    let app = build_router(test_config()).await;

    let resp = app
        .oneshot(post_message(serde_json::json!({
            "query": "getStats",
            "videoId": "dQw4w9WgXcQ"
        })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["likes"].is_u64());
    assert!(json["views"].is_u64());
}

#[tokio::test]
async fn get_stats_without_credential_answers_null() {
    let app = build_router(keyless_config()).await;

    let resp = app
        .oneshot(post_message(serde_json::json!({
            "query": "getStats",
            "videoId": "dQw4w9WgXcQ"
        })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "Failure is a null body, not an HTTP error");

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json.is_null());
}

#[tokio::test]
async fn update_settings_is_acknowledged() {
    let app = build_router(test_config()).await;

    let resp = app
        .oneshot(post_message(serde_json::json!({
            "query": "updateSettings",
            "cacheDuration": 900000,
            "apiKey": "abc123"
        })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::Value::Bool(true));
}

#[tokio::test]
async fn update_settings_enables_keyless_host() {
    let app = build_router(keyless_config()).await;

    // Keyless: null
    let resp = app
        .clone()
        .oneshot(post_message(serde_json::json!({
            "query": "getStats",
            "videoId": "a"
        })))
        .await
        .unwrap();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(serde_json::from_slice::<serde_json::Value>(&body)
        .unwrap()
        .is_null());

    // Configure a key at runtime...
    app.clone()
        .oneshot(post_message(serde_json::json!({
            "query": "updateSettings",
            "apiKey": "abc123"
        })))
        .await
        .unwrap();

    // ...and the same lookup now reaches the (unreachable) upstream and
    // still degrades to null rather than an error.
    let resp = app
        .oneshot(post_message(serde_json::json!({
            "query": "getStats",
            "videoId": "a"
        })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_query_is_rejected() {
    let app = build_router(test_config()).await;

    let resp = app
        .oneshot(post_message(serde_json::json!({
            "query": "getLikesData",
            "videoId": "a"
        })))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

// ── Metrics endpoint ────────────────────────────────────────────────────────

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = build_router(test_config()).await;

    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
