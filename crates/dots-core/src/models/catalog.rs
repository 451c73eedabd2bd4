//! Read-only projections of the streaming catalog and the label's roster.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackAlbum {
    pub id: Option<String>,
    pub name: String,
    pub images: Vec<CatalogImage>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<TrackArtist>,
    pub album: TrackAlbum,
    pub duration_ms: u64,
    pub explicit: bool,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
    pub isrc: Option<String>,
    pub external_urls: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub added_at: Option<String>,
    pub track: PlaylistTrack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: PlaylistOwner,
    pub followers: u64,
    pub public: Option<bool>,
    pub images: Vec<CatalogImage>,
    pub external_urls: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistData {
    pub playlist_info: PlaylistInfo,
    pub tracks: Vec<PlaylistItem>,
    pub total_tracks: usize,
    /// RFC 3339 timestamp of the fetch
    pub retrieved_at: String,
}

impl PlaylistData {
    /// Distinct ISRCs of tracks that came back without a preview URL.
    pub fn isrcs_missing_preview(&self) -> Vec<String> {
        let mut isrcs: Vec<String> = Vec::new();
        for item in &self.tracks {
            if item.track.preview_url.is_some() {
                continue;
            }
            if let Some(isrc) = item.track.isrc.as_deref().filter(|s| !s.is_empty()) {
                if !isrcs.iter().any(|known| known == isrc) {
                    isrcs.push(isrc.to_string());
                }
            }
        }
        isrcs
    }
}

/// One entry of the artist roster document.
///
/// Fields other than the known ones are preserved so the roster file can grow
/// without a code change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(default)]
    pub artist_name: String,
    #[serde(default)]
    pub artist_instagram_username: String,
    #[serde(default)]
    pub artist_soundcloud: String,
    #[serde(default)]
    pub artist_spotify: String,
    #[serde(default)]
    pub artist_beatport: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Roster entry enriched with the catalog profile image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistProfile {
    #[serde(flatten)]
    pub entry: RosterEntry,
    /// Largest catalog image URL, empty when none could be resolved.
    pub artist_image: String,
}

/// Events are opaque content records passed through unchanged.
pub type EventRecord = Value;

/// Outcome of a preview-fallback lookup for one ISRC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLookup {
    pub isrc: String,
    pub preview_url: Option<String>,
    pub external_track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreviewLookup {
    pub fn failed(isrc: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            isrc: isrc.into(),
            preview_url: None,
            external_track_id: None,
            error: Some(error.into()),
        }
    }
}
