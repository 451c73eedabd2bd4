use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A demo submission as received from the submission form.
///
/// Constructed per request and discarded afterwards; only the metadata
/// sidecar derived from it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSubmission {
    pub artist_name: String,
    pub track_title: String,
    pub email: String,
    pub full_name: String,
    pub instagram_username: String,
    pub beatport: Option<String>,
    pub facebook: Option<String>,
    pub x_twitter: Option<String>,
}

impl DemoSubmission {
    /// Build the sidecar document for this submission.
    pub fn to_metadata(
        &self,
        demo_id: impl Into<String>,
        submitted_at: impl Into<String>,
        content_hash: Option<String>,
    ) -> DemoMetadata {
        DemoMetadata {
            artist_name: self.artist_name.clone(),
            track_title: self.track_title.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            instagram_username: self.instagram_username.clone(),
            beatport: self.beatport.clone(),
            facebook: self.facebook.clone(),
            x_twitter: self.x_twitter.clone(),
            submitted_at: submitted_at.into(),
            demo_id: demo_id.into(),
            content_hash,
        }
    }
}

/// Persisted `<upload path>.metadata.json` sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoMetadata {
    pub artist_name: String,
    pub track_title: String,
    pub email: String,
    pub full_name: String,
    pub instagram_username: String,
    pub beatport: Option<String>,
    pub facebook: Option<String>,
    pub x_twitter: Option<String>,
    /// `YYYYMMDD_HHMMSS`, UTC
    pub submitted_at: String,
    pub demo_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// Direct-upload destination issued by the file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadLink {
    pub upload_url: String,
    pub path: String,
    pub demo_id: String,
}

/// Body of `POST /get-upload-link`
#[derive(Debug, Default, Deserialize)]
pub struct UploadLinkRequest {
    #[serde(default, alias = "cfTurnstileResponse", alias = "cf-turnstile-response")]
    pub cf_turnstile_response: Option<String>,
    #[serde(default, alias = "artistName")]
    pub artist_name: Option<String>,
    #[serde(default, alias = "trackTitle")]
    pub track_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadLinkResponse {
    pub upload_url: String,
    pub file_path: String,
    pub demo_id: String,
    pub session_id: Uuid,
    pub expires_in_seconds: u64,
}

/// Body of `POST /confirm-demo-upload`
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmUploadRequest {
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default, alias = "filePath")]
    pub file_path: Option<String>,
    #[serde(default, alias = "contentHash")]
    pub content_hash: Option<String>,
    #[serde(default, alias = "artistName")]
    pub artist_name: Option<String>,
    #[serde(default, alias = "trackTitle")]
    pub track_title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default, alias = "instagramUsername")]
    pub instagram_username: Option<String>,
    #[serde(default)]
    pub beatport: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default, alias = "xTwitter")]
    pub x_twitter: Option<String>,
}

/// Text fields of the `POST /submit-demo` multipart form.
#[derive(Debug, Default, Clone)]
pub struct RelayForm {
    pub cf_turnstile_response: Option<String>,
    pub artist_name: Option<String>,
    pub track_title: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub instagram_username: Option<String>,
    pub beatport: Option<String>,
    pub facebook: Option<String>,
    pub x_twitter: Option<String>,
}

impl RelayForm {
    /// Assign a multipart text field by its form name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "cf_turnstile_response" | "cf-turnstile-response" | "cfTurnstileResponse" => {
                &mut self.cf_turnstile_response
            }
            "artist_name" | "artistName" => &mut self.artist_name,
            "track_title" | "trackTitle" => &mut self.track_title,
            "email" => &mut self.email,
            "full_name" | "fullName" => &mut self.full_name,
            "instagram_username" | "instagramUsername" => &mut self.instagram_username,
            "beatport" => &mut self.beatport,
            "facebook" => &mut self.facebook,
            "x_twitter" | "xTwitter" => &mut self.x_twitter,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// An uploaded demo file received through the relay path.
#[derive(Debug, Clone)]
pub struct DemoFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Soft status of the confirmation email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailStatus {
    pub confirmation_sent: bool,
    pub email_error: Option<String>,
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub demo_id: String,
    pub email_status: EmailStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    pub message: String,
    pub demo_id: String,
    pub email_status: EmailStatus,
}

impl SubmissionResponse {
    pub fn new(message: impl Into<String>, outcome: SubmissionOutcome) -> Self {
        Self {
            message: message.into(),
            demo_id: outcome.demo_id,
            email_status: outcome.email_status,
        }
    }
}
