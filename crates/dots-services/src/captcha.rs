//! Challenge-token verification against Cloudflare Turnstile.
//!
//! Verification fails closed: configuration gaps, transport errors and
//! rejected tokens all come back as `success: false` with a user-facing
//! reason. Nothing here returns an error to the caller.

use async_trait::async_trait;
use serde::Deserialize;

/// Outcome of a single verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaVerification {
    pub success: bool,
    pub error: Option<String>,
}

impl CaptchaVerification {
    pub fn passed() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> CaptchaVerification;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Map Turnstile error codes to the message shown to the submitter.
pub fn message_for_error_codes(codes: &[String]) -> &'static str {
    let has = |code: &str| codes.iter().any(|c| c == code);
    if has("missing-input-secret") || has("invalid-input-secret") {
        "Server configuration error"
    } else if has("missing-input-response") {
        "CAPTCHA token is required"
    } else if has("invalid-input-response") {
        "Invalid CAPTCHA token"
    } else if has("timeout-or-duplicate") {
        "CAPTCHA token has expired or was already used"
    } else {
        "CAPTCHA verification failed"
    }
}

pub struct TurnstileVerifier {
    http_client: reqwest::Client,
    verify_url: String,
    secret_key: Option<String>,
}

impl TurnstileVerifier {
    pub fn new(
        http_client: reqwest::Client,
        verify_url: impl Into<String>,
        secret_key: Option<String>,
    ) -> Self {
        Self {
            http_client,
            verify_url: verify_url.into(),
            secret_key,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> CaptchaVerification {
        let Some(secret) = self.secret_key.as_deref() else {
            tracing::error!("TURNSTILE_SECRET_KEY is not configured");
            return CaptchaVerification::rejected(
                "Server configuration error: CAPTCHA secret key not found",
            );
        };

        if token.is_empty() {
            return CaptchaVerification::rejected("CAPTCHA token is required");
        }

        let mut form = vec![("secret", secret), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = match self.http_client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Turnstile verification request failed");
                return CaptchaVerification::rejected(
                    "CAPTCHA verification failed due to network error",
                );
            }
        };

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "Turnstile returned non-OK status");
            return CaptchaVerification::rejected("CAPTCHA verification service unavailable");
        }

        let body: SiteVerifyResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Unreadable Turnstile response");
                return CaptchaVerification::rejected(
                    "CAPTCHA verification failed due to network error",
                );
            }
        };

        if body.success {
            tracing::debug!("CAPTCHA verification passed");
            CaptchaVerification::passed()
        } else {
            tracing::warn!(error_codes = ?body.error_codes, "CAPTCHA verification rejected");
            CaptchaVerification::rejected(message_for_error_codes(&body.error_codes))
        }
    }
}
