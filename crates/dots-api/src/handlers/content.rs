//! Read-only label content: artist roster and events.

use crate::error::{ReadResource, ResourceError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use dots_core::AppError;
use serde_json::json;
use std::sync::Arc;

/// Roster entries enriched with their catalog profile image.
#[tracing::instrument(skip(state), fields(operation = "get_artists_data"))]
pub async fn get_artists_data(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ResourceError> {
    let fail = |e: AppError| ResourceError::new(ReadResource::Artists, e);

    let roster = state.label_store.read_roster().await.map_err(fail)?;
    let artists = state.catalog.get_artists_data(roster).await.map_err(fail)?;

    tracing::info!(total_artists = artists.len(), "Served artist data");
    Ok(Json(json!({
        "success": true,
        "total_artists": artists.len(),
        "data": artists,
        "message": "Successfully retrieved artist data",
    })))
}

#[tracing::instrument(skip(state), fields(operation = "get_events_data"))]
pub async fn get_events_data(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ResourceError> {
    let events = state
        .label_store
        .read_events_data()
        .await
        .map_err(|e| ResourceError::new(ReadResource::Events, e))?;

    Ok(Json(json!({
        "success": true,
        "total_events": events.len(),
        "data": events,
        "message": "Successfully retrieved events data",
    })))
}
