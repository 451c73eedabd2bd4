//! Playlist data with preview-audio fallback.

use crate::error::{ReadResource, ResourceError};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use dots_core::models::PlaylistData;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistParams {
    #[serde(default, alias = "playlistUrl")]
    pub playlist_url: Option<String>,
}

pub async fn get_playlist_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlaylistParams>,
) -> Result<Response, ResourceError> {
    playlist_response(&state, params).await
}

/// The body is optional; an unreadable body falls back to the default playlist.
pub async fn post_playlist_data(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ResourceError> {
    let params = serde_json::from_slice(&body).unwrap_or_default();
    playlist_response(&state, params).await
}

#[tracing::instrument(skip(state), fields(operation = "get_playlist_data"))]
async fn playlist_response(
    state: &AppState,
    params: PlaylistParams,
) -> Result<Response, ResourceError> {
    let playlist_url = params
        .playlist_url
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| state.config.default_playlist_url().to_string());

    let mut playlist = state
        .catalog
        .get_playlist_data(&playlist_url)
        .await
        .map_err(|e| ResourceError::new(ReadResource::Playlist, e))?;

    fill_missing_previews(state, &mut playlist).await;

    let message = format!(
        "Successfully retrieved data for playlist: {}",
        playlist.playlist_info.name
    );
    Ok(Json(json!({
        "success": true,
        "data": playlist,
        "message": message,
    }))
    .into_response())
}

/// Fill null preview URLs from the fallback source, keyed by ISRC.
async fn fill_missing_previews(state: &AppState, playlist: &mut PlaylistData) {
    let isrcs = playlist.isrcs_missing_preview();
    if isrcs.is_empty() {
        return;
    }

    let previews = state.previews.get_track_previews_by_isrcs(&isrcs).await;
    let mut filled = 0usize;

    for item in playlist.tracks.iter_mut() {
        if item.track.preview_url.is_some() {
            continue;
        }
        let found = item
            .track
            .isrc
            .as_ref()
            .and_then(|isrc| previews.get(isrc))
            .and_then(|lookup| lookup.preview_url.clone());
        if let Some(url) = found {
            item.track.preview_url = Some(url);
            filled += 1;
        }
    }

    tracing::debug!(
        missing = isrcs.len(),
        filled,
        "Applied preview fallback to playlist tracks"
    );
}
