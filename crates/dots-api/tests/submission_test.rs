//! Demo submission API integration tests.
//!
//! Run with: `cargo test -p dots-api --test submission_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use helpers::{confirm_body, setup_test_app, setup_test_app_with, TestOptions};
use serde_json::{json, Value};

const DEMO_PATH: &str = "/demos/submitted/DJ_Test - My_Song.mp3";

#[tokio::test]
async fn test_get_upload_link() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/get-upload-link")
        .json(&json!({
            "cf_turnstile_response": "token",
            "artist_name": "DJ Test",
            "track_title": "My Song",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["demo_id"], "DJ_Test - My_Song");
    assert_eq!(body["file_path"], DEMO_PATH);
    assert_eq!(body["expires_in_seconds"], 14400);
    assert!(body["upload_url"].as_str().unwrap().starts_with("https://uploads.test/"));
    assert!(body["session_id"].as_str().is_some());
    assert_eq!(app.captcha.calls(), 1);
    assert!(app.storage.writes().is_empty());
}

#[tokio::test]
async fn test_get_upload_link_accepts_camel_case() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/get-upload-link")
        .json(&json!({
            "cfTurnstileResponse": "token",
            "artistName": "DJ Test",
            "trackTitle": "My Song",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["file_path"], DEMO_PATH);
}

#[tokio::test]
async fn test_get_upload_link_requires_captcha_token() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/get-upload-link")
        .json(&json!({ "artist_name": "DJ Test", "track_title": "My Song" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "CAPTCHA verification is required"
    );
    assert_eq!(app.captcha.calls(), 0);
}

#[tokio::test]
async fn test_get_upload_link_captcha_rejected() {
    let app = setup_test_app_with(TestOptions {
        captcha_passes: false,
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .post("/get-upload-link")
        .json(&json!({
            "cf_turnstile_response": "bad",
            "artist_name": "DJ Test",
            "track_title": "My Song",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid CAPTCHA token");
    assert_eq!(body["code"], "CAPTCHA_REJECTED");
    assert_eq!(body["recoverable"], false);
    assert_eq!(
        body["suggested_action"],
        "Complete the CAPTCHA challenge again"
    );
    assert!(app.storage.writes().is_empty());
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_get_upload_link_missing_fields() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/get-upload-link")
        .json(&json!({ "cf_turnstile_response": "token", "artist_name": "DJ Test" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(error.contains("track_title"));
}

#[tokio::test]
async fn test_confirm_demo_upload_writes_metadata() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/confirm-demo-upload")
        .json(&confirm_body(DEMO_PATH))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Demo submission confirmed successfully");
    assert_eq!(body["demo_id"], "DJ_Test - My_Song");
    assert_eq!(body["email_status"]["confirmation_sent"], true);
    assert!(body["email_status"]["email_error"].is_null());

    let metadata_path = format!("{}.metadata.json", DEMO_PATH);
    assert_eq!(app.storage.writes(), vec![metadata_path.clone()]);
    let metadata: Value = serde_json::from_slice(&app.storage.get(&metadata_path).unwrap()).unwrap();
    assert_eq!(metadata["artist_name"], "DJ Test");
    assert_eq!(metadata["email"], "dj@example.com");
    assert!(metadata["beatport"].is_null());

    assert_eq!(
        app.mailer.sent(),
        vec![("dj@example.com".to_string(), "DJ_Test - My_Song".to_string())]
    );
}

#[tokio::test]
async fn test_confirm_demo_upload_rejects_foreign_path() {
    let app = setup_test_app().await;

    for path in [
        "/demos/submitted/song.wav",
        "/other/DJ_Test - My_Song.mp3",
        "/demos/submitted/../secret.mp3",
    ] {
        let response = app
            .client()
            .post("/confirm-demo-upload")
            .json(&confirm_body(path))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(response.json::<Value>()["error"], "Invalid file path");
    }

    assert!(app.storage.writes().is_empty());
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_confirm_demo_upload_invalid_email() {
    let app = setup_test_app().await;

    let mut body = confirm_body(DEMO_PATH);
    body["email"] = json!("not-an-email");
    let response = app.client().post("/confirm-demo-upload").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid email address format"
    );
    assert!(app.storage.writes().is_empty());
}

#[tokio::test]
async fn test_confirm_demo_upload_email_failure_is_soft() {
    let app = setup_test_app_with(TestOptions {
        mail_succeeds: false,
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .post("/confirm-demo-upload")
        .json(&confirm_body(DEMO_PATH))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["email_status"]["confirmation_sent"], false);
    assert!(!body["email_status"]["email_error"]
        .as_str()
        .unwrap()
        .is_empty());
    assert_eq!(app.storage.writes().len(), 1);
}

#[tokio::test]
async fn test_confirm_demo_upload_malformed_json() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/confirm-demo-upload")
        .text("{not json")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(app.storage.writes().is_empty());
}

fn relay_form(filename: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new()
        .add_text("cf-turnstile-response", "token")
        .add_text("artist_name", "DJ Test")
        .add_text("track_title", "My Song")
        .add_text("email", "dj@example.com")
        .add_text("full_name", "Dee Jay")
        .add_text("instagram_username", "djtest")
        .add_part(
            "demo_file",
            Part::bytes(data)
                .file_name(filename)
                .mime_type("audio/mpeg"),
        )
}

#[tokio::test]
async fn test_submit_demo_relays_file() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/submit-demo")
        .multipart(relay_form("song.mp3", b"ID3 demo bytes".to_vec()))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Demo submitted successfully");
    assert_eq!(body["demo_id"], "DJ_Test - My_Song");

    assert_eq!(
        app.storage.get(DEMO_PATH).as_deref(),
        Some(&b"ID3 demo bytes"[..])
    );
    assert!(app
        .storage
        .get(&format!("{}.metadata.json", DEMO_PATH))
        .is_some());
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_submit_demo_rejects_non_mp3() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/submit-demo")
        .multipart(relay_form("song.wav", b"RIFF".to_vec()))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Only MP3 files are allowed"
    );
    assert!(app.storage.writes().is_empty());
}

#[tokio::test]
async fn test_submit_demo_rejects_oversized_file() {
    let app = setup_test_app_with(TestOptions {
        max_demo_size_mb: 1,
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .post("/submit-demo")
        .multipart(relay_form("song.mp3", vec![0u8; 1024 * 1024 + 1]))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.storage.writes().is_empty());
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_submit_demo_captcha_rejected_before_storage() {
    let app = setup_test_app_with(TestOptions {
        captcha_passes: false,
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .post("/submit-demo")
        .multipart(relay_form("song.mp3", b"ID3".to_vec()))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert!(app.storage.writes().is_empty());
    assert!(app.mailer.sent().is_empty());
}
