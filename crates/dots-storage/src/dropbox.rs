//! Dropbox storage backend (HTTP API v2).
//!
//! Authenticates either with a long-lived refresh token (exchanged for
//! short-lived access tokens, cached until shortly before expiry) or with a
//! static access token.

use crate::traits::{DownloadResult, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Longest lifetime Dropbox accepts for a temporary upload link.
pub const MAX_UPLOAD_LINK_SECS: u64 = 4 * 60 * 60;

/// Refresh this long before the reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub enum DropboxCredentials {
    RefreshToken {
        refresh_token: String,
        app_key: String,
        app_secret: String,
    },
    AccessToken(String),
}

impl std::fmt::Debug for DropboxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropboxCredentials::RefreshToken { app_key, .. } => f
                .debug_struct("RefreshToken")
                .field("app_key", app_key)
                .finish_non_exhaustive(),
            DropboxCredentials::AccessToken(_) => f.write_str("AccessToken(..)"),
        }
    }
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct UploadLinkResponse {
    link: Option<String>,
}

/// Commit settings for a write: always overwrite, never rename.
fn commit_info(path: &str) -> serde_json::Value {
    json!({
        "path": path,
        "mode": "overwrite",
        "autorename": false,
        "mute": false,
    })
}

pub struct DropboxStorage {
    http_client: reqwest::Client,
    api_url: String,
    content_url: String,
    credentials: DropboxCredentials,
    token: RwLock<Option<CachedToken>>,
}

impl DropboxStorage {
    pub fn new(
        http_client: reqwest::Client,
        api_url: impl Into<String>,
        content_url: impl Into<String>,
        credentials: DropboxCredentials,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            content_url: content_url.into().trim_end_matches('/').to_string(),
            credentials,
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> StorageResult<String> {
        let (refresh_token, app_key, app_secret) = match &self.credentials {
            DropboxCredentials::AccessToken(token) => return Ok(token.clone()),
            DropboxCredentials::RefreshToken {
                refresh_token,
                app_key,
                app_secret,
            } => (refresh_token, app_key, app_secret),
        };

        if let Some(cached) = self.token.read().await.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.access_token.clone());
            }
        }

        let response = self
            .http_client
            .post(format!("{}/oauth2/token", self.api_url))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", app_key.as_str()),
                ("client_secret", app_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Dropbox token refresh rejected");
            return Err(StorageError::AuthenticationFailed(format!(
                "token refresh returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Invalid token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(14_400));
        let refresh_at = Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN);
        *self.token.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at,
        });

        tracing::debug!(expires_in_secs = lifetime.as_secs(), "Dropbox access token refreshed");
        Ok(token.access_token)
    }

    /// Map a non-success response to a storage error.
    async fn error_for(
        response: reqwest::Response,
        path: &str,
        fallback: fn(String) -> StorageError,
    ) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => StorageError::AuthenticationFailed(body),
            StatusCode::CONFLICT if body.contains("not_found") => {
                StorageError::NotFound(path.to_string())
            }
            _ => fallback(format!("{} returned {}: {}", path, status, body)),
        }
    }
}

/// Serialize a value for the `Dropbox-API-Arg` header.
///
/// Header values must be ASCII, so every non-ASCII character is written as a
/// JSON `\uXXXX` escape (surrogate pairs for characters outside the BMP).
pub fn header_safe_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[async_trait]
impl Storage for DropboxStorage {
    async fn temporary_upload_link(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let token = self.access_token().await?;
        let duration = expires_in.as_secs().clamp(60, MAX_UPLOAD_LINK_SECS);

        let body = json!({
            "commit_info": commit_info(path),
            "duration": duration,
        });

        let response = self
            .http_client
            .post(format!("{}/2/files/get_temporary_upload_link", self.api_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Upload link request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, path, StorageError::BackendError).await);
        }

        let parsed: UploadLinkResponse = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Invalid upload link response: {}", e)))?;

        let link = parsed
            .link
            .filter(|l| !l.is_empty())
            .ok_or_else(|| StorageError::BackendError("No upload link returned".to_string()))?;

        tracing::info!(path = %path, duration_secs = duration, "Issued temporary upload link");
        Ok(link)
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        let token = self.access_token().await?;
        let size = data.len();
        let arg = header_safe_json(&commit_info(path));

        let start = Instant::now();
        let response = self
            .http_client
            .post(format!("{}/2/files/upload", self.content_url))
            .bearer_auth(token)
            .header("Dropbox-API-Arg", arg)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, path, StorageError::UploadFailed).await);
        }

        tracing::info!(
            path = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Dropbox upload successful"
        );
        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<DownloadResult> {
        let token = self.access_token().await?;
        let arg = header_safe_json(&json!({ "path": path }));

        let response = self
            .http_client
            .post(format!("{}/2/files/download", self.content_url))
            .bearer_auth(token)
            .header("Dropbox-API-Arg", arg)
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("{}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, path, StorageError::DownloadFailed).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("{}: {}", path, e)))?;

        tracing::debug!(path = %path, size_bytes = bytes.len(), "Dropbox download successful");
        Ok(DownloadResult { bytes })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Dropbox
    }
}
