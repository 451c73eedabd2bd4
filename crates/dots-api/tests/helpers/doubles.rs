//! In-process stand-ins for storage and the third-party services.

use async_trait::async_trait;
use dots_core::models::{
    ArtistProfile, ChannelVideo, PlaylistData, PlaylistInfo, PlaylistItem, PlaylistOwner,
    PlaylistTrack, PreviewLookup, RosterEntry, TrackAlbum, TrackArtist, VideoFeed,
};
use dots_core::{AppError, StorageBackend};
use dots_services::{
    CaptchaVerification, CaptchaVerifier, CatalogClient, Mailer, PreviewFallbackClient,
    VideoFeedClient,
};
use dots_storage::{DownloadResult, Storage, StorageError, StorageResult};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Map-backed file store that records every write.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryStorage {
    pub fn put(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.into());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn temporary_upload_link(
        &self,
        path: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!("https://uploads.test/{}", path.trim_start_matches('/')))
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        self.writes.lock().unwrap().push(path.to_string());
        self.put(path, data);
        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<DownloadResult> {
        self.get(path)
            .map(DownloadResult::new)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub struct StubCaptcha {
    passes: bool,
    calls: AtomicUsize,
}

impl StubCaptcha {
    pub fn new(passes: bool) -> Self {
        Self {
            passes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaVerifier for StubCaptcha {
    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> CaptchaVerification {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.passes {
            CaptchaVerification::passed()
        } else {
            CaptchaVerification::rejected("Invalid CAPTCHA token")
        }
    }
}

pub struct RecordingMailer {
    succeeds: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new(succeeds: bool) -> Self {
        Self {
            succeeds,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// `(recipient, demo_id)` for every attempted send.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_demo_submission_confirmation(
        &self,
        to_email: &str,
        _artist_name: &str,
        _track_title: &str,
        demo_id: &str,
    ) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), demo_id.to_string()));
        self.succeeds
    }
}

/// Catalog that serves one playlist and gives every artist the same image.
pub struct StaticCatalog;

pub const ARTIST_IMAGE: &str = "https://i.scdn.co/image/artist";
pub const PLAYLIST_ID: &str = "253UKTc95dhq8FvVbLvroJ";
pub const PLAYLIST_NAME: &str = "Dots Picks";
pub const CATALOG_PREVIEW: &str = "https://p.scdn.co/mp3-preview/original";
pub const FALLBACK_PREVIEW: &str = "https://cdns-preview-d.dzcdn.net/stream/fallback.mp3";
/// ISRC the fallback source has a preview for.
pub const ISRC_WITH_FALLBACK: &str = "BEDOT2400002";
/// ISRC the fallback source fails on.
pub const ISRC_WITHOUT_FALLBACK: &str = "BEDOT2400003";

fn playlist_track(id: &str, isrc: Option<&str>, preview_url: Option<&str>) -> PlaylistItem {
    PlaylistItem {
        added_at: Some("2024-03-01T10:00:00Z".to_string()),
        track: PlaylistTrack {
            id: Some(id.to_string()),
            name: format!("Track {}", id),
            artists: vec![TrackArtist {
                id: Some("a1".to_string()),
                name: "Alpha".to_string(),
            }],
            album: TrackAlbum {
                id: Some("al1".to_string()),
                name: "Dots Vol. 1".to_string(),
                images: Vec::new(),
                release_date: Some("2024-03-01".to_string()),
            },
            duration_ms: 215_000,
            explicit: false,
            popularity: Some(12),
            preview_url: preview_url.map(String::from),
            isrc: isrc.map(String::from),
            external_urls: json!({ "spotify": format!("https://open.spotify.com/track/{}", id) }),
        },
    }
}

/// Tracks: one with a catalog preview, two sharing an ISRC the fallback
/// knows, one the fallback fails on, and one without an ISRC.
pub fn sample_playlist() -> PlaylistData {
    let tracks = vec![
        playlist_track("t1", Some("BEDOT2400001"), Some(CATALOG_PREVIEW)),
        playlist_track("t2", Some(ISRC_WITH_FALLBACK), None),
        playlist_track("t3", Some(ISRC_WITHOUT_FALLBACK), None),
        playlist_track("t4", Some(ISRC_WITH_FALLBACK), None),
        playlist_track("t5", None, None),
    ];
    PlaylistData {
        playlist_info: PlaylistInfo {
            id: PLAYLIST_ID.to_string(),
            name: PLAYLIST_NAME.to_string(),
            description: None,
            owner: PlaylistOwner {
                id: "collectingdots".to_string(),
                display_name: "Collecting Dots".to_string(),
            },
            followers: 42,
            public: Some(true),
            images: Vec::new(),
            external_urls: json!({ "spotify": format!("https://open.spotify.com/playlist/{}", PLAYLIST_ID) }),
        },
        total_tracks: tracks.len(),
        tracks,
        retrieved_at: "2024-03-02T00:00:00Z".to_string(),
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn get_playlist_data(&self, playlist_url: &str) -> Result<PlaylistData, AppError> {
        if playlist_url.contains("not-a-playlist") {
            return Err(AppError::InvalidInput(
                "Invalid Spotify playlist URL format".to_string(),
            ));
        }
        if playlist_url.contains(PLAYLIST_ID) {
            return Ok(sample_playlist());
        }
        Err(AppError::Upstream("Spotify API unavailable".to_string()))
    }

    async fn get_artists_data(
        &self,
        roster: Vec<RosterEntry>,
    ) -> Result<Vec<ArtistProfile>, AppError> {
        Ok(roster
            .into_iter()
            .map(|entry| ArtistProfile {
                entry,
                artist_image: ARTIST_IMAGE.to_string(),
            })
            .collect())
    }
}

/// Fallback source with a preview for [`ISRC_WITH_FALLBACK`] only.
#[derive(Default)]
pub struct StaticPreviews {
    lookups: Mutex<Vec<String>>,
}

impl StaticPreviews {
    /// Every ISRC looked up, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl PreviewFallbackClient for StaticPreviews {
    async fn get_track_preview_by_isrc(&self, isrc: &str) -> PreviewLookup {
        self.lookups.lock().unwrap().push(isrc.to_string());
        if isrc == ISRC_WITH_FALLBACK {
            PreviewLookup {
                isrc: isrc.to_string(),
                preview_url: Some(FALLBACK_PREVIEW.to_string()),
                external_track_id: Some("3135556".to_string()),
                error: None,
            }
        } else {
            PreviewLookup::failed(isrc, "Track not found on Deezer")
        }
    }
}

/// Video source that only knows the label's own channel.
pub struct StaticVideos;

pub const LABEL_CHANNEL: &str = "@CollectingDotsRecords";
pub const LABEL_CHANNEL_TITLE: &str = "Collecting Dots Records";

fn channel_video(id: &str) -> ChannelVideo {
    ChannelVideo {
        id: id.to_string(),
        title: format!("Set {}", id),
        description: String::new(),
        thumbnail: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
        published_at: "2 weeks ago".to_string(),
        duration: "1h 2m 3s".to_string(),
        view_count: "1.2K".to_string(),
        video_url: format!("https://www.youtube.com/watch?v={}", id),
    }
}

#[async_trait]
impl VideoFeedClient for StaticVideos {
    async fn get_channel_videos(
        &self,
        channel: &str,
        max_results: usize,
    ) -> Result<VideoFeed, AppError> {
        if channel != LABEL_CHANNEL {
            return Err(AppError::Upstream(format!(
                "Failed to fetch YouTube videos: channel {} unavailable",
                channel
            )));
        }
        let videos: Vec<ChannelVideo> = ["vid001", "vid002", "vid003"]
            .into_iter()
            .map(channel_video)
            .take(max_results)
            .collect();
        Ok(VideoFeed {
            channel_id: "UCdots".to_string(),
            channel_title: LABEL_CHANNEL_TITLE.to_string(),
            total_videos: videos.len(),
            videos,
        })
    }
}
