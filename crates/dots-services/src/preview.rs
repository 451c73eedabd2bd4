//! Preview-audio fallback through the Deezer public API.
//!
//! Every lookup failure is soft: it is reported in the entry's `error` field
//! and never fails the batch.

use async_trait::async_trait;
use dots_core::models::PreviewLookup;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Concurrent lookups per batch.
pub const PREVIEW_BATCH_SIZE: usize = 5;

/// Pause between consecutive batches.
pub const PREVIEW_BATCH_DELAY: Duration = Duration::from_millis(100);

#[async_trait]
pub trait PreviewFallbackClient: Send + Sync {
    async fn get_track_preview_by_isrc(&self, isrc: &str) -> PreviewLookup;

    /// Look up every distinct ISRC; the map has exactly one entry per distinct input.
    async fn get_track_previews_by_isrcs(&self, isrcs: &[String]) -> HashMap<String, PreviewLookup> {
        let mut distinct: Vec<&str> = Vec::with_capacity(isrcs.len());
        for isrc in isrcs {
            if !distinct.contains(&isrc.as_str()) {
                distinct.push(isrc.as_str());
            }
        }

        let mut results = HashMap::with_capacity(distinct.len());
        let batches: Vec<&[&str]> = distinct.chunks(PREVIEW_BATCH_SIZE).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let lookups = join_all(batch.iter().map(|isrc| self.get_track_preview_by_isrc(isrc)))
                .await;
            for (isrc, lookup) in batch.iter().zip(lookups) {
                results.insert(isrc.to_string(), lookup);
            }

            if index + 1 < batch_count {
                tokio::time::sleep(PREVIEW_BATCH_DELAY).await;
            }
        }

        tracing::debug!(
            requested = isrcs.len(),
            resolved = results.values().filter(|r| r.preview_url.is_some()).count(),
            "Preview fallback lookups finished"
        );
        results
    }
}

#[derive(Debug, Deserialize)]
struct DeezerError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeezerTrack {
    id: Option<u64>,
    preview: Option<String>,
    error: Option<DeezerError>,
}

/// Whether `candidate` parses as an absolute http(s) URL with a host.
pub fn is_well_formed_url(candidate: &str) -> bool {
    reqwest::Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

pub struct DeezerClient {
    http_client: reqwest::Client,
    api_url: String,
}

impl DeezerClient {
    pub fn new(http_client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PreviewFallbackClient for DeezerClient {
    async fn get_track_preview_by_isrc(&self, isrc: &str) -> PreviewLookup {
        if isrc.trim().is_empty() {
            return PreviewLookup::failed(isrc, "No ISRC provided");
        }

        let response = match self
            .http_client
            .get(format!("{}/track/isrc:{}", self.api_url, isrc))
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(isrc = %isrc, error = %e, "Deezer lookup failed");
                return PreviewLookup::failed(isrc, format!("Failed to fetch from Deezer: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return PreviewLookup::failed(
                isrc,
                format!("Deezer API returned {}", status.as_u16()),
            );
        }

        let track: DeezerTrack = match response.json().await {
            Ok(track) => track,
            Err(e) => {
                tracing::warn!(isrc = %isrc, error = %e, "Unreadable Deezer response");
                return PreviewLookup::failed(isrc, format!("Failed to fetch from Deezer: {}", e));
            }
        };

        if let Some(error) = track.error {
            return PreviewLookup::failed(
                isrc,
                error
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Track not found on Deezer".to_string()),
            );
        }

        let external_track_id = track.id.map(|id| id.to_string());
        let preview = track.preview.filter(|p| !p.trim().is_empty());

        match preview {
            Some(url) if is_well_formed_url(&url) => PreviewLookup {
                isrc: isrc.to_string(),
                preview_url: Some(url),
                external_track_id,
                error: None,
            },
            Some(url) => {
                tracing::warn!(isrc = %isrc, preview = %url, "Invalid preview URL format");
                PreviewLookup {
                    external_track_id,
                    ..PreviewLookup::failed(isrc, "Invalid preview URL format")
                }
            }
            None => PreviewLookup {
                external_track_id,
                ..PreviewLookup::failed(isrc, "No preview URL available")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    #[tokio::test]
    async fn test_preview_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/2.0/track/isrc:GBX1")
            .with_status(200)
            .with_body(r#"{"id":3135556,"title":"Track","preview":"https://cdns-preview-d.dzcdn.net/stream/c-abc-1.mp3"}"#)
            .create_async()
            .await;

        let client = DeezerClient::new(reqwest::Client::new(), format!("{}/2.0", server.url()));
        let lookup = client.get_track_preview_by_isrc("GBX1").await;

        assert_eq!(
            lookup.preview_url.as_deref(),
            Some("https://cdns-preview-d.dzcdn.net/stream/c-abc-1.mp3")
        );
        assert_eq!(lookup.external_track_id.as_deref(), Some("3135556"));
        assert!(lookup.error.is_none());
    }

    #[tokio::test]
    async fn test_soft_failures() {
        let mut server = mockito::Server::new_async().await;
        let _m1 = server
            .mock("GET", "/2.0/track/isrc:MISSING")
            .with_status(200)
            .with_body(r#"{"error":{"type":"DataException","message":"no data","code":800}}"#)
            .create_async()
            .await;
        let _m2 = server
            .mock("GET", "/2.0/track/isrc:BADURL")
            .with_status(200)
            .with_body(r#"{"id":1,"preview":"not a url"}"#)
            .create_async()
            .await;
        let _m3 = server
            .mock("GET", "/2.0/track/isrc:NOPREVIEW")
            .with_status(200)
            .with_body(r#"{"id":2,"preview":""}"#)
            .create_async()
            .await;
        let _m4 = server
            .mock("GET", "/2.0/track/isrc:DOWN")
            .with_status(502)
            .create_async()
            .await;

        let client = DeezerClient::new(reqwest::Client::new(), format!("{}/2.0", server.url()));

        let missing = client.get_track_preview_by_isrc("MISSING").await;
        assert_eq!(missing.error.as_deref(), Some("no data"));

        let bad = client.get_track_preview_by_isrc("BADURL").await;
        assert_eq!(bad.error.as_deref(), Some("Invalid preview URL format"));
        assert_eq!(bad.external_track_id.as_deref(), Some("1"));

        let none = client.get_track_preview_by_isrc("NOPREVIEW").await;
        assert_eq!(none.error.as_deref(), Some("No preview URL available"));

        let down = client.get_track_preview_by_isrc("DOWN").await;
        assert_eq!(down.error.as_deref(), Some("Deezer API returned 502"));

        let empty = client.get_track_preview_by_isrc("").await;
        assert_eq!(empty.error.as_deref(), Some("No ISRC provided"));
    }

    /// Records batch boundaries by tracking how many lookups are in flight.
    struct CountingClient {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        started: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl PreviewFallbackClient for CountingClient {
        async fn get_track_preview_by_isrc(&self, isrc: &str) -> PreviewLookup {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.started.lock().unwrap().push(Instant::now());
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if isrc.ends_with('3') {
                PreviewLookup::failed(isrc, "Track not found on Deezer")
            } else {
                PreviewLookup {
                    isrc: isrc.to_string(),
                    preview_url: Some(format!("https://cdn.example/{}.mp3", isrc)),
                    external_track_id: None,
                    error: None,
                }
            }
        }
    }

    #[tokio::test]
    async fn test_seven_isrcs_make_two_batches() {
        let client = CountingClient {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
        };
        let isrcs: Vec<String> = (1..=7).map(|i| format!("ISRC{}", i)).collect();

        let results = client.get_track_previews_by_isrcs(&isrcs).await;

        assert_eq!(results.len(), 7);
        assert_eq!(client.calls.load(Ordering::SeqCst), 7);
        assert!(client.max_in_flight.load(Ordering::SeqCst) <= PREVIEW_BATCH_SIZE);
        assert!(results["ISRC3"].error.is_some());
        assert!(results["ISRC7"].preview_url.is_some());

        let started = client.started.lock().unwrap();
        let gap = started[5].duration_since(started[4]);
        assert!(gap >= PREVIEW_BATCH_DELAY, "second batch started after {:?}", gap);
    }

    #[tokio::test]
    async fn test_duplicate_isrcs_collapse() {
        let client = CountingClient {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
        };
        let isrcs = vec!["A1".to_string(), "A1".to_string(), "B2".to_string()];
        let results = client.get_track_previews_by_isrcs(&isrcs).await;
        assert_eq!(results.len(), 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_url_validation() {
        assert!(is_well_formed_url("https://cdns-preview.dzcdn.net/a.mp3"));
        assert!(!is_well_formed_url("ftp://example.com/a.mp3"));
        assert!(!is_well_formed_url("/relative/a.mp3"));
    }
}
