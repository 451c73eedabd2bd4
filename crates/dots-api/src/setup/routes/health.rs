//! Health check handler.

use axum::{http::StatusCode, response::IntoResponse, Json};

/// Liveness only: the service keeps no connections worth probing.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
