//! Route configuration and setup.
//!
//! Every site route is served both at the root and under `/api`.

mod health;

use crate::handlers::{content, playlist, submission, videos};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, request::Parts, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use dots_core::Config;
use dots_infra::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for the text fields sent alongside a relayed demo file.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub const API_PREFIX: &str = "/api";

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let cors = setup_cors(config);

    let site = site_routes();

    Router::new()
        .route("/health", get(health::health_check))
        .merge(site.clone())
        .nest(API_PREFIX, site)
        .layer(RequestBodyLimitLayer::new(
            config.max_demo_size_bytes() + FORM_OVERHEAD_BYTES,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state)
}

fn site_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get-upload-link", post(submission::get_upload_link))
        .route(
            "/confirm-demo-upload",
            post(submission::confirm_demo_upload),
        )
        .route("/submit-demo", post(submission::submit_demo))
        .route(
            "/get-artists-data",
            get(content::get_artists_data).post(content::get_artists_data),
        )
        .route(
            "/get-events-data",
            get(content::get_events_data).post(content::get_events_data),
        )
        .route(
            "/get-playlist-data",
            get(playlist::get_playlist_data).post(playlist::post_playlist_data),
        )
        .route(
            "/get-youtube-videos",
            get(videos::get_youtube_videos).post(videos::post_youtube_videos),
        )
}

/// Origins are allowed when they contain one of the configured patterns.
fn setup_cors(config: &Config) -> CorsLayer {
    let patterns: Vec<String> = config.cors_origin_patterns().to_vec();
    tracing::info!(patterns = %patterns.join(","), "CORS origin patterns configured");

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| origin_allowed(&patterns, origin),
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn origin_allowed(patterns: &[String], origin: &HeaderValue) -> bool {
    origin
        .to_str()
        .map(|o| {
            let o = o.to_lowercase();
            patterns.iter().any(|p| o.contains(p.as_str()))
        })
        .unwrap_or(false)
}
