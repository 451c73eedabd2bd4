//! Confirmation mail through the Gmail send API (OAuth2 refresh-token flow).
//!
//! Delivery is best effort: [`Mailer::send_demo_submission_confirmation`]
//! reports `false` instead of failing, so a mail outage never rejects a
//! submission that was already stored.

pub mod template;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use lettre::message::{Mailbox, MultiPart};
use lettre::{Address, Message};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Single-slot access-token cache shared by every send.
///
/// Starts empty (or seeded), is filled by the first token exchange and is
/// cleared when the send API answers 401. Never persisted.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(token: Option<String>) -> Self {
        Self {
            slot: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }

    pub async fn get(&self) -> Option<String> {
        self.slot.read().await.clone()
    }

    pub async fn set(&self, token: String) {
        *self.slot.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns whether the confirmation was accepted by the mail provider.
    async fn send_demo_submission_confirmation(
        &self,
        to_email: &str,
        artist_name: &str,
        track_title: &str,
        demo_id: &str,
    ) -> bool;
}

/// OAuth client registration used to refresh the Gmail access token.
#[derive(Clone)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for GmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

pub struct GmailMailer {
    http_client: reqwest::Client,
    api_url: String,
    oauth_url: String,
    credentials: Option<GmailCredentials>,
    from: Mailbox,
    label_name: String,
    tokens: Arc<TokenCache>,
}

impl GmailMailer {
    pub fn new(
        http_client: reqwest::Client,
        api_url: impl Into<String>,
        oauth_url: impl Into<String>,
        credentials: Option<GmailCredentials>,
        from_address: &str,
        label_name: impl Into<String>,
        tokens: Arc<TokenCache>,
    ) -> Result<Self> {
        let label_name = label_name.into();
        let address: Address = from_address
            .parse()
            .with_context(|| format!("Invalid sender address: {}", from_address))?;

        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            oauth_url: oauth_url.into().trim_end_matches('/').to_string(),
            credentials,
            from: Mailbox::new(Some(label_name.clone()), address),
            label_name,
            tokens,
        })
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.tokens.get().await {
            return Ok(token);
        }
        self.refresh_access_token().await
    }

    async fn refresh_access_token(&self) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .context("Gmail API credentials not configured")?;

        let response = self
            .http_client
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("Failed to send token refresh request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Token refresh failed: {} - {}",
                status,
                error_text
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;
        self.tokens.set(token.access_token.clone()).await;
        tracing::debug!("Gmail access token refreshed");

        Ok(token.access_token)
    }

    /// RFC 5322 message, base64url-encoded without padding as the send API expects.
    fn encode_message(&self, to: &str, subject: &str, text: String, html: String) -> Result<String> {
        let recipient: Mailbox = to
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", to))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))
            .context("Failed to build confirmation message")?;

        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(message.formatted()))
    }

    async fn post_message(&self, token: &str, raw: &str) -> Result<reqwest::Response> {
        self.http_client
            .post(format!("{}/gmail/v1/users/me/messages/send", self.api_url))
            .bearer_auth(token)
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .context("Failed to send message request")
    }

    async fn deliver(&self, to: &str, subject: &str, text: String, html: String) -> Result<()> {
        let raw = self.encode_message(to, subject, text, html)?;

        let token = self.access_token().await?;
        let mut response = self.post_message(&token, &raw).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Gmail access token rejected, refreshing");
            self.tokens.clear().await;
            let token = self.refresh_access_token().await?;
            response = self.post_message(&token, &raw).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Gmail send failed: {} - {}",
                status,
                error_text
            ));
        }

        let sent: SendResponse = response.json().await.unwrap_or(SendResponse { id: None });
        tracing::info!(
            message_id = sent.id.as_deref().unwrap_or("unknown"),
            "Confirmation email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send_demo_submission_confirmation(
        &self,
        to_email: &str,
        artist_name: &str,
        track_title: &str,
        demo_id: &str,
    ) -> bool {
        let content =
            template::demo_submission_confirmation(&self.label_name, artist_name, track_title, demo_id);

        match self
            .deliver(to_email, &content.subject, content.text_body, content.html_body)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, demo_id = %demo_id, "Failed to send confirmation email");
                false
            }
        }
    }
}
