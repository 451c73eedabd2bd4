//! Configuration validation
//!
//! Fails fast on settings that break every request; credentials that only
//! disable one feature are logged as warnings.

use anyhow::Result;
use dots_core::{Config, StorageBackend};

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.turnstile_secret_key().is_none() {
        tracing::warn!(
            "TURNSTILE_SECRET_KEY not set - every demo submission will fail CAPTCHA verification"
        );
    }

    if config.spotify_client_id().is_none() || config.spotify_client_secret().is_none() {
        tracing::warn!(
            "SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET not set - playlist and artist endpoints will fail"
        );
    }

    if config.gmail_client_id().is_none()
        || config.gmail_client_secret().is_none()
        || config.gmail_refresh_token().is_none()
    {
        tracing::warn!(
            "Gmail OAuth credentials incomplete - confirmation emails will only be sent while GMAIL_ACCESS_TOKEN is valid"
        );
    }

    if config.is_production() && config.storage_backend() == StorageBackend::Local {
        tracing::warn!(
            "Local storage backend in production - direct upload links are unavailable"
        );
    }

    if config.trusted_proxy_count() > 10 {
        tracing::warn!(
            trusted_proxy_count = config.trusted_proxy_count(),
            "TRUSTED_PROXY_COUNT is very high - ensure this matches your actual proxy setup"
        );
    }

    Ok(())
}
