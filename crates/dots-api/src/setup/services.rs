//! Service construction from configuration

use crate::state::AppState;
use anyhow::{Context, Result};
use dots_core::Config;
use dots_services::{
    DeezerClient, DemoSubmissionPipeline, GmailCredentials, GmailMailer, LabelStore,
    SpotifyClient, TokenCache, TurnstileVerifier, YouTubeClient,
};
use dots_storage::Storage;
use std::sync::Arc;
use std::time::Duration;

/// Wire every service client around one shared HTTP client.
pub fn initialize_services(config: &Config, storage: Arc<dyn Storage>) -> Result<Arc<AppState>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_client_timeout_secs()))
        .build()
        .context("Failed to build HTTP client")?;

    let label_store = Arc::new(LabelStore::new(
        storage,
        config.demo_upload_dir(),
        config.artists_data_path(),
        config.events_data_path(),
        Duration::from_secs(config.upload_link_ttl_secs()),
    ));

    let captcha = Arc::new(TurnstileVerifier::new(
        http_client.clone(),
        config.turnstile_verify_url(),
        config.turnstile_secret_key().map(String::from),
    ));

    let mailer = Arc::new(
        GmailMailer::new(
            http_client.clone(),
            config.gmail_api_url(),
            config.google_oauth_url(),
            gmail_credentials(config),
            config.mail_from_address(),
            config.label_name(),
            Arc::new(TokenCache::seeded(
                config.gmail_access_token().map(String::from),
            )),
        )
        .context("Failed to configure mailer")?,
    );

    let submissions = Arc::new(DemoSubmissionPipeline::new(
        captcha,
        label_store.clone(),
        mailer,
        config.max_demo_size_bytes(),
    ));

    let catalog = Arc::new(SpotifyClient::new(
        http_client.clone(),
        config.spotify_api_url(),
        config.spotify_accounts_url(),
        config.spotify_client_id().map(String::from),
        config.spotify_client_secret().map(String::from),
    ));

    let previews = Arc::new(DeezerClient::new(
        http_client.clone(),
        config.deezer_api_url(),
    ));

    let videos = Arc::new(YouTubeClient::new(http_client, config.youtube_base_url()));

    tracing::info!("Services initialized");

    Ok(Arc::new(AppState {
        config: config.clone(),
        label_store,
        submissions,
        catalog,
        previews,
        videos,
    }))
}

fn gmail_credentials(config: &Config) -> Option<GmailCredentials> {
    match (
        config.gmail_client_id(),
        config.gmail_client_secret(),
        config.gmail_refresh_token(),
    ) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(GmailCredentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
        }),
        _ => None,
    }
}
