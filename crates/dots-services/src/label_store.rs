//! Label content and demo files on top of a [`Storage`] backend.
//!
//! Storage failures are normalised here into [`AppError`] categories with the
//! messages shown to clients; raw backend errors only reach the logs.

use dots_core::models::{DemoMetadata, DemoSubmission, EventRecord, RosterEntry, UploadLink};
use dots_core::validation::{demo_file_path, demo_id, metadata_path};
use dots_core::AppError;
use dots_storage::{Storage, StorageError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Which label content document is being read; drives the error wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Artists,
    Events,
}

impl ContentKind {
    fn array_key(self) -> &'static str {
        match self {
            ContentKind::Artists => "artists",
            ContentKind::Events => "events",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            ContentKind::Artists => "artist",
            ContentKind::Events => "events",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ContentKind::Artists => "Artist",
            ContentKind::Events => "Events",
        }
    }
}

pub struct LabelStore {
    storage: Arc<dyn Storage>,
    demo_upload_dir: String,
    artists_data_path: String,
    events_data_path: String,
    upload_link_ttl: Duration,
}

impl LabelStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        demo_upload_dir: impl Into<String>,
        artists_data_path: impl Into<String>,
        events_data_path: impl Into<String>,
        upload_link_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            demo_upload_dir: demo_upload_dir.into().trim_end_matches('/').to_string(),
            artists_data_path: artists_data_path.into(),
            events_data_path: events_data_path.into(),
            upload_link_ttl,
        }
    }

    pub fn demo_upload_dir(&self) -> &str {
        &self.demo_upload_dir
    }

    pub fn upload_link_ttl(&self) -> Duration {
        self.upload_link_ttl
    }

    /// Issue a direct-upload link for the demo file of an artist/title pair.
    ///
    /// The destination is overwritten if it already exists.
    pub async fn get_temporary_upload_link(
        &self,
        artist_name: &str,
        track_title: &str,
    ) -> Result<UploadLink, AppError> {
        let demo_id = demo_id(artist_name, track_title);
        let path = demo_file_path(&self.demo_upload_dir, &demo_id);

        let upload_url = self
            .storage
            .temporary_upload_link(&path, self.upload_link_ttl)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path = %path, "Failed to generate upload link");
                match e {
                    StorageError::AuthenticationFailed(_) => {
                        AppError::UpstreamAuth("Storage authentication failed".to_string())
                    }
                    _ => AppError::Upstream("Failed to generate upload link".to_string()),
                }
            })?;

        Ok(UploadLink {
            upload_url,
            path,
            demo_id,
        })
    }

    /// Write the metadata sidecar next to an uploaded demo file.
    pub async fn save_metadata(
        &self,
        file_path: &str,
        metadata: &DemoMetadata,
    ) -> Result<String, AppError> {
        let body = serde_json::to_vec_pretty(metadata)
            .map_err(|e| AppError::Internal(format!("Failed to serialize demo metadata: {}", e)))?;
        let path = metadata_path(file_path);

        self.storage
            .upload(&path, body)
            .await
            .map_err(|e| write_error(e, "Failed to save demo metadata"))?;

        tracing::info!(path = %path, demo_id = %metadata.demo_id, "Saved demo metadata");
        Ok(metadata.demo_id.clone())
    }

    /// Relay path: write the audio bytes and the metadata sidecar in one call.
    pub async fn upload_demo(
        &self,
        data: Vec<u8>,
        submission: &DemoSubmission,
        submitted_at: &str,
    ) -> Result<String, AppError> {
        let demo_id = demo_id(&submission.artist_name, &submission.track_title);
        let path = demo_file_path(&self.demo_upload_dir, &demo_id);
        let size = data.len();

        self.storage
            .upload(&path, data)
            .await
            .map_err(|e| write_error(e, "Failed to upload demo"))?;
        tracing::info!(path = %path, size_bytes = size, "Uploaded demo file");

        let metadata = submission.to_metadata(demo_id.clone(), submitted_at, None);
        self.save_metadata(&path, &metadata).await?;

        Ok(demo_id)
    }

    /// The `artists` array of the roster document, exactly as stored.
    pub async fn read_artists_data(&self) -> Result<Vec<Value>, AppError> {
        self.read_content_array(&self.artists_data_path, ContentKind::Artists)
            .await
    }

    /// The roster parsed into typed entries.
    pub async fn read_roster(&self) -> Result<Vec<RosterEntry>, AppError> {
        self.read_artists_data()
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).map_err(|e| {
                    AppError::InvalidInput(format!(
                        "Invalid artist entry at index {}: {}",
                        index, e
                    ))
                })
            })
            .collect()
    }

    pub async fn read_events_data(&self) -> Result<Vec<EventRecord>, AppError> {
        self.read_content_array(&self.events_data_path, ContentKind::Events)
            .await
    }

    async fn read_content_array(
        &self,
        path: &str,
        kind: ContentKind,
    ) -> Result<Vec<Value>, AppError> {
        let download = self.storage.download(path).await.map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to read content file");
            match e {
                StorageError::NotFound(_) => AppError::NotFound(format!(
                    "{} data file not found in storage at {}",
                    kind.title(),
                    path
                )),
                StorageError::AuthenticationFailed(_) => {
                    AppError::UpstreamAuth("Storage authentication failed".to_string())
                }
                other => AppError::Upstream(format!(
                    "Failed to read {} data from storage: {}",
                    kind.noun(),
                    other
                )),
            }
        })?;

        let document: Value = serde_json::from_slice(&download.bytes).map_err(|_| {
            AppError::InvalidInput(format!("Invalid JSON format in {} data file", kind.noun()))
        })?;

        match document {
            Value::Object(mut map) => match map.remove(kind.array_key()) {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(structure_error(kind)),
            },
            _ => Err(structure_error(kind)),
        }
    }
}

fn structure_error(kind: ContentKind) -> AppError {
    AppError::InvalidInput(format!(
        "Invalid JSON structure: expected \"{}\" array",
        kind.array_key()
    ))
}

fn write_error(err: StorageError, context: &str) -> AppError {
    tracing::error!(error = %err, "{}", context);
    match err {
        StorageError::AuthenticationFailed(_) => {
            AppError::UpstreamAuth("Storage authentication failed".to_string())
        }
        other => AppError::Upstream(format!("{}: {}", context, other)),
    }
}
