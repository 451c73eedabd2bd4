#[cfg(feature = "storage-dropbox")]
use crate::dropbox::{DropboxCredentials, DropboxStorage};
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use dots_core::Config;
use std::sync::Arc;

/// Create the storage backend selected by `STORAGE_BACKEND`.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-dropbox")]
        StorageBackend::Dropbox => {
            let credentials = dropbox_credentials(config)?;
            let http_client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(
                    config.http_client_timeout_secs(),
                ))
                .build()
                .map_err(|e| {
                    StorageError::ConfigError(format!("Failed to build HTTP client: {}", e))
                })?;

            let storage = DropboxStorage::new(
                http_client,
                config.dropbox_api_url(),
                config.dropbox_content_url(),
                credentials,
            );
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-dropbox"))]
        StorageBackend::Dropbox => Err(StorageError::ConfigError(
            "Dropbox storage backend not available (storage-dropbox feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Refresh-token credentials win over a static access token when both are set.
#[cfg(feature = "storage-dropbox")]
fn dropbox_credentials(config: &Config) -> StorageResult<DropboxCredentials> {
    if let (Some(refresh_token), Some(app_key), Some(app_secret)) = (
        config.dropbox_refresh_token(),
        config.dropbox_app_key(),
        config.dropbox_app_secret(),
    ) {
        return Ok(DropboxCredentials::RefreshToken {
            refresh_token: refresh_token.to_string(),
            app_key: app_key.to_string(),
            app_secret: app_secret.to_string(),
        });
    }

    config
        .dropbox_access_token()
        .map(|token| DropboxCredentials::AccessToken(token.to_string()))
        .ok_or_else(|| StorageError::ConfigError("Dropbox credentials not configured".to_string()))
}
