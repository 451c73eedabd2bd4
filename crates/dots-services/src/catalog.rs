//! Streaming-catalog client (Spotify Web API, client-credentials flow).

use async_trait::async_trait;
use chrono::Utc;
use dots_core::models::{
    ArtistProfile, CatalogImage, PlaylistData, PlaylistInfo, PlaylistItem, PlaylistOwner,
    PlaylistTrack, RosterEntry, TrackAlbum, TrackArtist,
};
use dots_core::AppError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Page size for playlist item requests.
pub const PLAYLIST_PAGE_SIZE: usize = 50;

const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

static PLAYLIST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/playlist/([A-Za-z0-9]+)").expect("playlist pattern is valid"));

static ARTIST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/artist/([A-Za-z0-9]+)").expect("artist pattern is valid"));

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn get_playlist_data(&self, playlist_url: &str) -> Result<PlaylistData, AppError>;

    /// Enrich each roster entry with its largest catalog profile image.
    async fn get_artists_data(
        &self,
        roster: Vec<RosterEntry>,
    ) -> Result<Vec<ArtistProfile>, AppError>;
}

fn extract_id(input: &str, pattern: &Regex, kind: &str) -> Result<String, AppError> {
    if !input.starts_with("http") {
        return Ok(input.to_string());
    }
    pattern
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid Spotify {} URL format", kind)))
}

/// Playlist id from a share URL; anything not starting with `http` is taken as an id already.
pub fn extract_playlist_id(input: &str) -> Result<String, AppError> {
    extract_id(input, &PLAYLIST_ID, "playlist")
}

pub fn extract_artist_id(input: &str) -> Result<String, AppError> {
    extract_id(input, &ARTIST_ID, "artist")
}

/// Widest image wins; the first one is kept on ties.
pub fn largest_image(images: &[CatalogImage]) -> Option<&CatalogImage> {
    images.iter().fold(None, |best, image| match best {
        Some(current) if image.width.unwrap_or(0) <= current.width.unwrap_or(0) => Some(current),
        _ => Some(image),
    })
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    3600
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct ApiImage {
    url: String,
    height: Option<u32>,
    width: Option<u32>,
}

impl From<ApiImage> for CatalogImage {
    fn from(image: ApiImage) -> Self {
        CatalogImage {
            url: image.url,
            height: image.height,
            width: image.width,
        }
    }
}

#[derive(Deserialize)]
struct ApiOwner {
    id: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ApiFollowers {
    total: Option<u64>,
}

#[derive(Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
    description: Option<String>,
    owner: ApiOwner,
    followers: Option<ApiFollowers>,
    public: Option<bool>,
    #[serde(default)]
    images: Option<Vec<ApiImage>>,
    #[serde(default)]
    external_urls: Value,
}

#[derive(Deserialize)]
struct ApiArtistRef {
    id: Option<String>,
    name: String,
}

#[derive(Deserialize)]
struct ApiAlbum {
    id: Option<String>,
    name: String,
    #[serde(default)]
    images: Vec<ApiImage>,
    release_date: Option<String>,
}

#[derive(Deserialize)]
struct ApiExternalIds {
    isrc: Option<String>,
}

#[derive(Deserialize)]
struct ApiTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtistRef>,
    album: ApiAlbum,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    explicit: bool,
    popularity: Option<u32>,
    preview_url: Option<String>,
    external_ids: Option<ApiExternalIds>,
    #[serde(default)]
    external_urls: Value,
}

#[derive(Deserialize)]
struct ApiPlaylistItem {
    added_at: Option<String>,
    track: Option<ApiTrack>,
}

#[derive(Deserialize)]
struct ApiItemsPage {
    #[serde(default)]
    items: Vec<ApiPlaylistItem>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct ApiArtist {
    #[serde(default)]
    images: Vec<ApiImage>,
}

impl ApiPlaylistItem {
    /// `None` for local files and removed tracks, which come back with a null track.
    fn into_item(self) -> Option<PlaylistItem> {
        let track = self.track?;
        Some(PlaylistItem {
            added_at: self.added_at,
            track: PlaylistTrack {
                id: track.id,
                name: track.name,
                artists: track
                    .artists
                    .into_iter()
                    .map(|a| TrackArtist {
                        id: a.id,
                        name: a.name,
                    })
                    .collect(),
                album: TrackAlbum {
                    id: track.album.id,
                    name: track.album.name,
                    images: track.album.images.into_iter().map(Into::into).collect(),
                    release_date: track.album.release_date,
                },
                duration_ms: track.duration_ms,
                explicit: track.explicit,
                popularity: track.popularity,
                preview_url: track.preview_url,
                isrc: track
                    .external_ids
                    .and_then(|ids| ids.isrc)
                    .filter(|isrc| !isrc.is_empty()),
                external_urls: track.external_urls,
            },
        })
    }
}

pub struct SpotifyClient {
    http_client: reqwest::Client,
    api_url: String,
    accounts_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    token: RwLock<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(
        http_client: reqwest::Client,
        api_url: impl Into<String>,
        accounts_url: impl Into<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            accounts_url: accounts_url.into().trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.access_token.clone());
            }
        }

        let (Some(client_id), Some(client_secret)) =
            (self.client_id.as_deref(), self.client_secret.as_deref())
        else {
            anyhow::bail!("Spotify credentials are not configured");
        };

        let response = self
            .http_client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("token request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("token request returned {} - {}", status, error_text);
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in);
        *self.token.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        });
        tracing::debug!(expires_in_secs = lifetime.as_secs(), "Spotify access token refreshed");

        Ok(token.access_token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("request to {} failed: {}", path, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("{} returned {} - {}", path, status, error_text);
        }

        Ok(response.json().await?)
    }

    async fn fetch_playlist(&self, playlist_id: &str) -> anyhow::Result<PlaylistData> {
        let playlist: ApiPlaylist = self
            .get_json(&format!("/playlists/{}", playlist_id), &[])
            .await?;

        let mut tracks = Vec::new();
        let mut offset = 0;
        loop {
            let page: ApiItemsPage = self
                .get_json(
                    &format!("/playlists/{}/tracks", playlist_id),
                    &[
                        ("limit", PLAYLIST_PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;

            tracks.extend(page.items.into_iter().filter_map(ApiPlaylistItem::into_item));

            if page.next.is_none() {
                break;
            }
            offset += PLAYLIST_PAGE_SIZE;
        }

        let owner_name = playlist
            .owner
            .display_name
            .unwrap_or_else(|| playlist.owner.id.clone());

        Ok(PlaylistData {
            playlist_info: PlaylistInfo {
                id: playlist.id,
                name: playlist.name,
                description: Some(playlist.description.unwrap_or_default()),
                owner: PlaylistOwner {
                    id: playlist.owner.id,
                    display_name: owner_name,
                },
                followers: playlist.followers.and_then(|f| f.total).unwrap_or(0),
                public: Some(playlist.public.unwrap_or(false)),
                images: playlist
                    .images
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
                external_urls: playlist.external_urls,
            },
            total_tracks: tracks.len(),
            tracks,
            retrieved_at: Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    async fn get_playlist_data(&self, playlist_url: &str) -> Result<PlaylistData, AppError> {
        let playlist_id = extract_playlist_id(playlist_url)?;

        let data = self.fetch_playlist(&playlist_id).await.map_err(|e| {
            tracing::error!(error = %e, playlist_id = %playlist_id, "Failed to fetch playlist");
            AppError::Upstream(format!("Failed to fetch playlist data: {}", e))
        })?;

        tracing::info!(
            playlist_id = %playlist_id,
            total_tracks = data.total_tracks,
            "Fetched playlist"
        );
        Ok(data)
    }

    async fn get_artists_data(
        &self,
        roster: Vec<RosterEntry>,
    ) -> Result<Vec<ArtistProfile>, AppError> {
        let mut profiles = Vec::with_capacity(roster.len());

        for entry in roster {
            let link = entry.artist_spotify.trim();
            if link.is_empty() {
                profiles.push(ArtistProfile {
                    entry,
                    artist_image: String::new(),
                });
                continue;
            }

            let artist_id = match extract_artist_id(link) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(
                        artist = %entry.artist_name,
                        error = %e,
                        "Roster entry has no resolvable artist id"
                    );
                    profiles.push(ArtistProfile {
                        entry,
                        artist_image: String::new(),
                    });
                    continue;
                }
            };

            let artist: ApiArtist = self
                .get_json(&format!("/artists/{}", artist_id), &[])
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, artist_id = %artist_id, "Failed to fetch artist");
                    AppError::Upstream(format!("Failed to fetch artist data: {}", e))
                })?;

            let images: Vec<CatalogImage> = artist.images.into_iter().map(Into::into).collect();
            let artist_image = largest_image(&images)
                .map(|image| image.url.clone())
                .unwrap_or_default();

            profiles.push(ArtistProfile {
                entry,
                artist_image,
            });
        }

        Ok(profiles)
    }
}
