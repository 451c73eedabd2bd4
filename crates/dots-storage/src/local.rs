use crate::traits::{DownloadResult, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Mirrors the remote store's path layout under a root directory. Used for
/// development and tests; it cannot issue direct-upload links.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path` (created if missing).
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a store path to a filesystem path under the root.
    ///
    /// Rejects `..` segments so a path can never escape the root directory.
    fn path_to_fs(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() || relative.contains("..") || relative.contains('\0') {
            return Err(StorageError::InvalidKey(format!(
                "Storage path contains invalid characters: {}",
                path
            )));
        }

        let joined = self.base_path.join(relative);
        if joined.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage path resolves outside storage directory".to_string(),
            ));
        }

        Ok(joined)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn temporary_upload_link(
        &self,
        _path: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::ConfigError(
            "Direct upload links are not supported by the local storage backend".to_string(),
        ))
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        let fs_path = self.path_to_fs(path)?;
        let size = data.len();

        self.ensure_parent_dir(&fs_path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&fs_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                fs_path.display(),
                e
            ))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", fs_path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", fs_path.display(), e))
        })?;

        tracing::info!(
            path = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<DownloadResult> {
        let fs_path = self.path_to_fs(path)?;

        if !fs::try_exists(&fs_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let data = fs::read(&fs_path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", fs_path.display(), e))
        })?;

        tracing::debug!(path = %path, size_bytes = data.len(), "Local storage download successful");

        Ok(DownloadResult::new(data))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
