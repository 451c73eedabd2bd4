//! Channel video feed.

use crate::error::{ReadResource, ResourceError};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use dots_services::DEFAULT_MAX_RESULTS;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct VideoParams {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, rename = "maxResults", alias = "max_results")]
    pub max_results: Option<String>,
}

pub async fn get_youtube_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VideoParams>,
) -> Result<Response, ResourceError> {
    let max_results = parse_max_results(params.max_results.as_deref());
    videos_response(&state, params.channel, max_results).await
}

/// `maxResults` may arrive as a number or a numeric string.
pub async fn post_youtube_videos(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ResourceError> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let channel = body
        .get("channel")
        .and_then(Value::as_str)
        .map(String::from);
    let max_results = match body.get("maxResults").or_else(|| body.get("max_results")) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_RESULTS),
        Some(Value::String(s)) => parse_max_results(Some(s)),
        _ => DEFAULT_MAX_RESULTS,
    };

    videos_response(&state, channel, max_results).await
}

fn parse_max_results(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_MAX_RESULTS)
}

#[tracing::instrument(skip(state), fields(operation = "get_youtube_videos"))]
async fn videos_response(
    state: &AppState,
    channel: Option<String>,
    max_results: usize,
) -> Result<Response, ResourceError> {
    let channel = channel
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config.default_youtube_channel().to_string());

    let feed = state
        .videos
        .get_channel_videos(&channel, max_results)
        .await
        .map_err(|e| ResourceError::new(ReadResource::Videos, e))?;

    let message = format!(
        "Successfully retrieved {} videos from {}",
        feed.total_videos, feed.channel_title
    );
    Ok(Json(json!({
        "success": true,
        "data": feed,
        "message": message,
    }))
    .into_response())
}
