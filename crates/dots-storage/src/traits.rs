//! Storage abstraction trait
//!
//! Defines the [`Storage`] trait every file-store backend implements.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidKey(String),

    #[error("Storage authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Bytes of a downloaded file.
///
/// Every backend returns this one shape, whatever its transport looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub bytes: Bytes,
}

impl DownloadResult {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// Storage abstraction trait
///
/// **Path format:** paths are absolute within the store (`/demos/submitted/x.mp3`)
/// and must not contain `..`. Writes always overwrite an existing file at the
/// same path; the store never auto-renames.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Issue a short-lived URL the client can upload the file at `path` to directly.
    ///
    /// Backends without direct uploads return a `ConfigError`.
    async fn temporary_upload_link(&self, path: &str, expires_in: Duration)
        -> StorageResult<String>;

    /// Write `data` to `path`, replacing any existing file.
    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Read the file at `path`.
    async fn download(&self, path: &str) -> StorageResult<DownloadResult>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
