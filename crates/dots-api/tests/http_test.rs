//! Cross-cutting HTTP behavior: prefixes, CORS, request IDs and headers.
//!
//! Run with: `cargo test -p dots-api --test http_test`

mod helpers;

use axum::http::header::{ACCESS_CONTROL_REQUEST_METHOD, ORIGIN};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use helpers::{setup_test_app, ALLOWED_ORIGIN, EVENTS_PATH};
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_routes_served_under_api_prefix() {
    let app = setup_test_app().await;
    app.storage
        .put(EVENTS_PATH, json!({ "events": [] }).to_string());

    let root = app.client().get("/get-events-data").await;
    let prefixed = app.client().get("/api/get-events-data").await;

    assert_eq!(root.status_code(), StatusCode::OK);
    assert_eq!(prefixed.status_code(), StatusCode::OK);
    assert_eq!(root.json::<Value>(), prefixed.json::<Value>());
}

#[tokio::test]
async fn test_cors_preflight_allowed_origin() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .method(Method::OPTIONS, "/api/get-upload-link")
        .add_header(ORIGIN, HeaderValue::from_static(ALLOWED_ORIGIN))
        .add_header(ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("POST"))
        .await;

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some(ALLOWED_ORIGIN)
    );
}

#[tokio::test]
async fn test_cors_preflight_rejected_origin() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .method(Method::OPTIONS, "/get-upload-link")
        .add_header(ORIGIN, HeaderValue::from_static("https://evil.example"))
        .add_header(ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("POST"))
        .await;

    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn test_request_id_generated_and_echoed() {
    let app = setup_test_app().await;

    let generated = app.client().get("/health").await;
    assert!(generated.headers().get("x-request-id").is_some());

    let echoed = app
        .client()
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc-123"),
        )
        .await;
    assert_eq!(
        echoed
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("trace-abc-123")
    );
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert_eq!(
        response
            .headers()
            .get("x-frame-options")
            .and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().get("/does-not-exist").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
