//! Configuration module
//!
//! Settings for the HTTP server, the file store and the third-party services
//! the site proxies (CAPTCHA, catalog, preview fallback, mail, video feed).

use std::env;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const UPLOAD_LINK_TTL_SECS: u64 = 4 * 60 * 60;
const MAX_DEMO_SIZE_MB: usize = 50;
const HTTP_CLIENT_TIMEOUT_SECS: u64 = 30;
const TRUSTED_PROXY_COUNT: usize = 1;

pub const DEFAULT_ARTISTS_DATA_PATH: &str = "/artists/artist_urls.json";
pub const DEFAULT_EVENTS_DATA_PATH: &str = "/events/events.json";
pub const DEFAULT_DEMO_UPLOAD_DIR: &str = "/demos/submitted";
pub const DEFAULT_PLAYLIST_URL: &str = "https://open.spotify.com/playlist/253UKTc95dhq8FvVbLvroJ";
pub const DEFAULT_YOUTUBE_CHANNEL: &str = "@CollectingDotsRecords";
pub const DEFAULT_MAIL_FROM: &str = "office@collectingdots.com";
pub const DEFAULT_LABEL_NAME: &str = "Collecting Dots Records";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    /// Substrings an `Origin` header must contain to be allowed by CORS.
    pub cors_origin_patterns: Vec<String>,
    pub environment: String,
    pub http_client_timeout_secs: u64,
    /// Proxies in front of the service whose `X-Forwarded-For` entries are trusted.
    pub trusted_proxy_count: usize,
}

/// Full site configuration
#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub base: BaseConfig,
    // File store
    pub storage_backend: StorageBackend,
    pub dropbox_refresh_token: Option<String>,
    pub dropbox_app_key: Option<String>,
    pub dropbox_app_secret: Option<String>,
    pub dropbox_access_token: Option<String>,
    pub dropbox_api_url: String,
    pub dropbox_content_url: String,
    pub local_storage_path: Option<String>,
    pub artists_data_path: String,
    pub events_data_path: String,
    pub demo_upload_dir: String,
    pub upload_link_ttl_secs: u64,
    pub max_demo_size_bytes: usize,
    // CAPTCHA
    pub turnstile_secret_key: Option<String>,
    pub turnstile_verify_url: String,
    // Catalog + preview fallback
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_api_url: String,
    pub spotify_accounts_url: String,
    pub default_playlist_url: String,
    pub deezer_api_url: String,
    // Mail
    pub gmail_client_id: Option<String>,
    pub gmail_client_secret: Option<String>,
    pub gmail_refresh_token: Option<String>,
    pub gmail_access_token: Option<String>,
    pub gmail_api_url: String,
    pub google_oauth_url: String,
    pub mail_from_address: String,
    pub label_name: String,
    // Video feed
    pub youtube_base_url: String,
    pub default_youtube_channel: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<SiteConfig>);

impl Config {
    fn site(&self) -> &SiteConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.site().base.environment)
    }

    /// Load configuration from the process environment (and `.env` when present)
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config(Box::new(SiteConfig::from_env()?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.site().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.site().base.server_port
    }

    pub fn cors_origin_patterns(&self) -> &[String] {
        &self.site().base.cors_origin_patterns
    }

    pub fn environment(&self) -> &str {
        &self.site().base.environment
    }

    pub fn http_client_timeout_secs(&self) -> u64 {
        self.site().base.http_client_timeout_secs
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.site().base.trusted_proxy_count
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.site().storage_backend
    }

    pub fn dropbox_refresh_token(&self) -> Option<&str> {
        self.site().dropbox_refresh_token.as_deref()
    }

    pub fn dropbox_app_key(&self) -> Option<&str> {
        self.site().dropbox_app_key.as_deref()
    }

    pub fn dropbox_app_secret(&self) -> Option<&str> {
        self.site().dropbox_app_secret.as_deref()
    }

    pub fn dropbox_access_token(&self) -> Option<&str> {
        self.site().dropbox_access_token.as_deref()
    }

    pub fn dropbox_api_url(&self) -> &str {
        &self.site().dropbox_api_url
    }

    pub fn dropbox_content_url(&self) -> &str {
        &self.site().dropbox_content_url
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.site().local_storage_path.as_deref()
    }

    pub fn artists_data_path(&self) -> &str {
        &self.site().artists_data_path
    }

    pub fn events_data_path(&self) -> &str {
        &self.site().events_data_path
    }

    pub fn demo_upload_dir(&self) -> &str {
        &self.site().demo_upload_dir
    }

    pub fn upload_link_ttl_secs(&self) -> u64 {
        self.site().upload_link_ttl_secs
    }

    pub fn max_demo_size_bytes(&self) -> usize {
        self.site().max_demo_size_bytes
    }

    pub fn turnstile_secret_key(&self) -> Option<&str> {
        self.site().turnstile_secret_key.as_deref()
    }

    pub fn turnstile_verify_url(&self) -> &str {
        &self.site().turnstile_verify_url
    }

    pub fn spotify_client_id(&self) -> Option<&str> {
        self.site().spotify_client_id.as_deref()
    }

    pub fn spotify_client_secret(&self) -> Option<&str> {
        self.site().spotify_client_secret.as_deref()
    }

    pub fn spotify_api_url(&self) -> &str {
        &self.site().spotify_api_url
    }

    pub fn spotify_accounts_url(&self) -> &str {
        &self.site().spotify_accounts_url
    }

    pub fn default_playlist_url(&self) -> &str {
        &self.site().default_playlist_url
    }

    pub fn deezer_api_url(&self) -> &str {
        &self.site().deezer_api_url
    }

    pub fn gmail_client_id(&self) -> Option<&str> {
        self.site().gmail_client_id.as_deref()
    }

    pub fn gmail_client_secret(&self) -> Option<&str> {
        self.site().gmail_client_secret.as_deref()
    }

    pub fn gmail_refresh_token(&self) -> Option<&str> {
        self.site().gmail_refresh_token.as_deref()
    }

    pub fn gmail_access_token(&self) -> Option<&str> {
        self.site().gmail_access_token.as_deref()
    }

    pub fn gmail_api_url(&self) -> &str {
        &self.site().gmail_api_url
    }

    pub fn google_oauth_url(&self) -> &str {
        &self.site().google_oauth_url
    }

    pub fn mail_from_address(&self) -> &str {
        &self.site().mail_from_address
    }

    pub fn label_name(&self) -> &str {
        &self.site().label_name
    }

    pub fn youtube_base_url(&self) -> &str {
        &self.site().youtube_base_url
    }

    pub fn default_youtube_channel(&self) -> &str {
        &self.site().default_youtube_channel
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

impl SiteConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let var_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origin_patterns = var_or("CORS_ALLOWED_ORIGIN_PATTERNS", "collectingdots.com,localhost")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: var_or("PORT", &SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origin_patterns,
            environment,
            http_client_timeout_secs: var("HTTP_CLIENT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CLIENT_TIMEOUT_SECS),
            trusted_proxy_count: var("TRUSTED_PROXY_COUNT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(TRUSTED_PROXY_COUNT),
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::Dropbox,
        };

        let config = SiteConfig {
            base,
            storage_backend,
            dropbox_refresh_token: var("DROPBOX_REFRESH_TOKEN"),
            dropbox_app_key: var("DROPBOX_APP_KEY"),
            dropbox_app_secret: var("DROPBOX_APP_SECRET"),
            dropbox_access_token: var("DROPBOX_ACCESS_TOKEN"),
            dropbox_api_url: var_or("DROPBOX_API_URL", "https://api.dropboxapi.com"),
            dropbox_content_url: var_or("DROPBOX_CONTENT_URL", "https://content.dropboxapi.com"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            artists_data_path: var_or("ARTISTS_DATA_PATH", DEFAULT_ARTISTS_DATA_PATH),
            events_data_path: var_or("EVENTS_DATA_PATH", DEFAULT_EVENTS_DATA_PATH),
            demo_upload_dir: var_or("DEMO_UPLOAD_DIR", DEFAULT_DEMO_UPLOAD_DIR)
                .trim_end_matches('/')
                .to_string(),
            upload_link_ttl_secs: var("UPLOAD_LINK_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(UPLOAD_LINK_TTL_SECS),
            max_demo_size_bytes: var("MAX_DEMO_SIZE_MB")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(MAX_DEMO_SIZE_MB)
                * 1024
                * 1024,
            turnstile_secret_key: var("TURNSTILE_SECRET_KEY"),
            turnstile_verify_url: var_or(
                "TURNSTILE_VERIFY_URL",
                "https://challenges.cloudflare.com/turnstile/v0/siteverify",
            ),
            spotify_client_id: var("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: var("SPOTIFY_CLIENT_SECRET"),
            spotify_api_url: var_or("SPOTIFY_API_URL", "https://api.spotify.com/v1"),
            spotify_accounts_url: var_or("SPOTIFY_ACCOUNTS_URL", "https://accounts.spotify.com"),
            default_playlist_url: var_or("DEFAULT_PLAYLIST_URL", DEFAULT_PLAYLIST_URL),
            deezer_api_url: var_or("DEEZER_API_URL", "https://api.deezer.com/2.0"),
            gmail_client_id: var("GMAIL_CLIENT_ID"),
            gmail_client_secret: var("GMAIL_CLIENT_SECRET"),
            gmail_refresh_token: var("GMAIL_REFRESH_TOKEN"),
            gmail_access_token: var("GMAIL_ACCESS_TOKEN"),
            gmail_api_url: var_or("GMAIL_API_URL", "https://gmail.googleapis.com"),
            google_oauth_url: var_or("GOOGLE_OAUTH_URL", "https://oauth2.googleapis.com"),
            mail_from_address: var_or("MAIL_FROM_ADDRESS", DEFAULT_MAIL_FROM),
            label_name: var_or("LABEL_NAME", DEFAULT_LABEL_NAME),
            youtube_base_url: var_or("YOUTUBE_BASE_URL", "https://www.youtube.com"),
            default_youtube_channel: var_or("DEFAULT_YOUTUBE_CHANNEL", DEFAULT_YOUTUBE_CHANNEL),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::Dropbox => {
                let has_refresh = self.dropbox_refresh_token.is_some()
                    && self.dropbox_app_key.is_some()
                    && self.dropbox_app_secret.is_some();
                if !has_refresh && self.dropbox_access_token.is_none() {
                    return Err(anyhow::anyhow!(
                        "Dropbox credentials not configured: set DROPBOX_REFRESH_TOKEN, DROPBOX_APP_KEY and DROPBOX_APP_SECRET, or DROPBOX_ACCESS_TOKEN"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.upload_link_ttl_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_LINK_TTL_SECS must be greater than 0"));
        }

        if !self.demo_upload_dir.starts_with('/') {
            return Err(anyhow::anyhow!(
                "DEMO_UPLOAD_DIR must be an absolute path (e.g. /demos/submitted)"
            ));
        }

        if is_production_name(&self.base.environment) && self.base.cors_origin_patterns.is_empty() {
            return Err(anyhow::anyhow!(
                "CORS_ALLOWED_ORIGIN_PATTERNS cannot be empty in production"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_access_token() {
        let config =
            SiteConfig::from_lookup(lookup(&[("DROPBOX_ACCESS_TOKEN", "sl.token")])).unwrap();
        assert_eq!(config.base.server_port, 3000);
        assert_eq!(config.storage_backend, StorageBackend::Dropbox);
        assert_eq!(config.upload_link_ttl_secs, 14400);
        assert_eq!(config.artists_data_path, "/artists/artist_urls.json");
        assert_eq!(config.demo_upload_dir, "/demos/submitted");
        assert_eq!(
            config.base.cors_origin_patterns,
            vec!["collectingdots.com".to_string(), "localhost".to_string()]
        );
        assert_eq!(config.max_demo_size_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_dropbox_requires_credentials() {
        let err = SiteConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("Dropbox credentials not configured"));

        // Partial refresh-token credentials are not enough on their own.
        let err = SiteConfig::from_lookup(lookup(&[
            ("DROPBOX_REFRESH_TOKEN", "r"),
            ("DROPBOX_APP_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Dropbox credentials"));

        assert!(SiteConfig::from_lookup(lookup(&[
            ("DROPBOX_REFRESH_TOKEN", "r"),
            ("DROPBOX_APP_KEY", "k"),
            ("DROPBOX_APP_SECRET", "s"),
        ]))
        .is_ok());
    }

    #[test]
    fn test_local_backend_requires_path() {
        let err = SiteConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "local")])).unwrap_err();
        assert!(err.to_string().contains("LOCAL_STORAGE_PATH"));

        let config = SiteConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/dots"),
        ]))
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Local);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = SiteConfig::from_lookup(lookup(&[
            ("DROPBOX_ACCESS_TOKEN", "t"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = SiteConfig::from_lookup(lookup(&[
            ("DROPBOX_ACCESS_TOKEN", "t"),
            ("TURNSTILE_SECRET_KEY", "  "),
            ("DEMO_UPLOAD_DIR", "/incoming/"),
        ]))
        .unwrap();
        assert!(config.turnstile_secret_key.is_none());
        assert_eq!(config.demo_upload_dir, "/incoming");
    }

    #[test]
    fn test_production_detection() {
        let config = Config(Box::new(
            SiteConfig::from_lookup(lookup(&[
                ("DROPBOX_ACCESS_TOKEN", "t"),
                ("ENVIRONMENT", "Production"),
            ]))
            .unwrap(),
        ));
        assert!(config.is_production());
    }
}
