#![allow(dead_code)]

//! Test helpers: build AppState and router for integration tests.
//!
//! Every outside service is replaced by an in-process double so tests run
//! without network access. Run with `cargo test -p dots-api`.

pub mod doubles;

use axum_test::TestServer;
use dots_api::setup::routes;
use dots_api::state::AppState;
use dots_core::{Config, SiteConfig};
use dots_services::{DemoSubmissionPipeline, LabelStore};
use doubles::{
    MemoryStorage, RecordingMailer, StaticCatalog, StaticPreviews, StaticVideos, StubCaptcha,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const ALLOWED_ORIGIN: &str = "https://collectingdots.com";
pub const ARTISTS_PATH: &str = "/artists/artist_urls.json";
pub const EVENTS_PATH: &str = "/events/events.json";

/// Knobs for the doubles wired into a test app.
pub struct TestOptions {
    pub captcha_passes: bool,
    pub mail_succeeds: bool,
    pub max_demo_size_mb: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            captcha_passes: true,
            mail_succeeds: true,
            max_demo_size_mb: 50,
        }
    }
}

/// Test application: server plus handles on the doubles for assertions.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<MemoryStorage>,
    pub captcha: Arc<StubCaptcha>,
    pub mailer: Arc<RecordingMailer>,
    pub previews: Arc<StaticPreviews>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config(max_demo_size_mb: usize) -> Config {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("ENVIRONMENT", "test".to_string());
    vars.insert("DROPBOX_ACCESS_TOKEN", "test-token".to_string());
    vars.insert("CORS_ALLOWED_ORIGIN_PATTERNS", "collectingdots.com,localhost".to_string());
    vars.insert("ARTISTS_DATA_PATH", ARTISTS_PATH.to_string());
    vars.insert("EVENTS_DATA_PATH", EVENTS_PATH.to_string());
    vars.insert("MAX_DEMO_SIZE_MB", max_demo_size_mb.to_string());

    let site = SiteConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("Failed to build test configuration");
    Config(Box::new(site))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let config = test_config(options.max_demo_size_mb);

    let storage = Arc::new(MemoryStorage::default());
    let captcha = Arc::new(StubCaptcha::new(options.captcha_passes));
    let mailer = Arc::new(RecordingMailer::new(options.mail_succeeds));
    let previews = Arc::new(StaticPreviews::default());

    let label_store = Arc::new(LabelStore::new(
        storage.clone(),
        config.demo_upload_dir(),
        config.artists_data_path(),
        config.events_data_path(),
        Duration::from_secs(config.upload_link_ttl_secs()),
    ));

    let submissions = Arc::new(DemoSubmissionPipeline::new(
        captcha.clone(),
        label_store.clone(),
        mailer.clone(),
        config.max_demo_size_bytes(),
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        label_store,
        submissions,
        catalog: Arc::new(StaticCatalog),
        previews: previews.clone(),
        videos: Arc::new(StaticVideos),
    });

    let router = routes::setup_routes(&config, state);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        storage,
        captcha,
        mailer,
        previews,
    }
}

/// A complete confirmation body for the demo uploaded as `file_path`.
pub fn confirm_body(file_path: &str) -> serde_json::Value {
    serde_json::json!({
        "session_id": "3f2b8c1e-2d7a-4c55-9a0e-0c1f3e5d7b9a",
        "file_path": file_path,
        "artist_name": "DJ Test",
        "track_title": "My Song",
        "email": "dj@example.com",
        "full_name": "Dee Jay",
        "instagram_username": "djtest",
    })
}
