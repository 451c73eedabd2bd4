//! Demo submission pipeline.
//!
//! Two entry flows share one validation path:
//! - two-phase: [`DemoSubmissionPipeline::issue_upload_link`], the client uploads
//!   directly to the file store, then [`DemoSubmissionPipeline::confirm_upload`]
//! - relay: [`DemoSubmissionPipeline::relay_submission`] receives the file itself
//!
//! The confirmation email is best effort and never fails a submission.

use crate::captcha::CaptchaVerifier;
use crate::label_store::LabelStore;
use crate::mailer::Mailer;
use chrono::Utc;
use dots_core::models::{
    ConfirmUploadRequest, DemoFile, DemoSubmission, EmailStatus, RelayForm, SubmissionOutcome,
    UploadLinkRequest, UploadLinkResponse,
};
use dots_core::validation::{
    demo_id, has_mp3_extension, is_valid_demo_path, is_valid_email, missing_fields, non_blank,
    submission_timestamp, MAX_NAME_LENGTH,
};
use dots_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

pub const EMAIL_FAILURE_MESSAGE: &str = "Failed to send confirmation email";

pub struct DemoSubmissionPipeline {
    captcha: Arc<dyn CaptchaVerifier>,
    store: Arc<LabelStore>,
    mailer: Arc<dyn Mailer>,
    max_demo_size_bytes: usize,
}

impl DemoSubmissionPipeline {
    pub fn new(
        captcha: Arc<dyn CaptchaVerifier>,
        store: Arc<LabelStore>,
        mailer: Arc<dyn Mailer>,
        max_demo_size_bytes: usize,
    ) -> Self {
        Self {
            captcha,
            store,
            mailer,
            max_demo_size_bytes,
        }
    }

    pub fn max_demo_size_bytes(&self) -> usize {
        self.max_demo_size_bytes
    }

    async fn verify_captcha(
        &self,
        token: &Option<String>,
        remote_ip: Option<&str>,
    ) -> Result<(), AppError> {
        let token = non_blank(token).ok_or_else(|| {
            AppError::BadRequest("CAPTCHA verification is required".to_string())
        })?;

        let verification = self.captcha.verify(token, remote_ip).await;
        if verification.success {
            return Ok(());
        }

        let reason = verification
            .error
            .unwrap_or_else(|| "CAPTCHA verification failed".to_string());
        tracing::warn!(remote_ip = ?remote_ip, reason = %reason, "CAPTCHA rejected");
        Err(AppError::CaptchaRejected(reason))
    }

    /// Pre-upload step: a direct-upload destination for the demo file.
    pub async fn issue_upload_link(
        &self,
        request: UploadLinkRequest,
        remote_ip: Option<&str>,
    ) -> Result<UploadLinkResponse, AppError> {
        self.verify_captcha(&request.cf_turnstile_response, remote_ip)
            .await?;

        let missing = missing_fields(&[
            ("artist_name", &request.artist_name),
            ("track_title", &request.track_title),
        ]);
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }
        let artist_name = request.artist_name.as_deref().unwrap_or_default();
        let track_title = request.track_title.as_deref().unwrap_or_default();

        if artist_name.chars().count() > MAX_NAME_LENGTH
            || track_title.chars().count() > MAX_NAME_LENGTH
        {
            return Err(AppError::BadRequest(format!(
                "Artist name and track title must be under {} characters",
                MAX_NAME_LENGTH
            )));
        }

        let link = self
            .store
            .get_temporary_upload_link(artist_name, track_title)
            .await?;
        let session_id = Uuid::new_v4();

        tracing::info!(
            demo_id = %link.demo_id,
            session_id = %session_id,
            "Issued demo upload link"
        );

        Ok(UploadLinkResponse {
            upload_url: link.upload_url,
            file_path: link.path,
            demo_id: link.demo_id,
            session_id,
            expires_in_seconds: self.store.upload_link_ttl().as_secs(),
        })
    }

    /// Confirmation step: record metadata for a file the client already uploaded.
    pub async fn confirm_upload(
        &self,
        request: ConfirmUploadRequest,
    ) -> Result<SubmissionOutcome, AppError> {
        let missing = missing_fields(&[
            ("session_id", &request.session_id),
            ("file_path", &request.file_path),
            ("artist_name", &request.artist_name),
            ("track_title", &request.track_title),
            ("email", &request.email),
            ("full_name", &request.full_name),
            ("instagram_username", &request.instagram_username),
        ]);
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }

        let submission = submission_from_fields(
            &request.artist_name,
            &request.track_title,
            &request.email,
            &request.full_name,
            &request.instagram_username,
            &request.beatport,
            &request.facebook,
            &request.x_twitter,
        );
        if !is_valid_email(&submission.email) {
            return Err(AppError::BadRequest(
                "Invalid email address format".to_string(),
            ));
        }

        let file_path = non_blank(&request.file_path).unwrap_or_default();
        if !is_valid_demo_path(self.store.demo_upload_dir(), file_path) {
            tracing::warn!(file_path = %file_path, "Rejected demo confirmation path");
            return Err(AppError::BadRequest("Invalid file path".to_string()));
        }

        let demo_id = demo_id(
            request.artist_name.as_deref().unwrap_or_default(),
            request.track_title.as_deref().unwrap_or_default(),
        );
        let metadata = submission.to_metadata(
            demo_id,
            submission_timestamp(Utc::now()),
            non_blank(&request.content_hash).map(String::from),
        );
        let demo_id = self.store.save_metadata(file_path, &metadata).await?;

        tracing::info!(demo_id = %demo_id, file_path = %file_path, "Demo upload confirmed");
        Ok(self.finish(&submission, demo_id).await)
    }

    /// Relay path: the demo file arrives with the form and is stored server-side.
    pub async fn relay_submission(
        &self,
        form: RelayForm,
        file: Option<DemoFile>,
        remote_ip: Option<&str>,
    ) -> Result<SubmissionOutcome, AppError> {
        self.verify_captcha(&form.cf_turnstile_response, remote_ip)
            .await?;

        let file = file.ok_or_else(|| AppError::BadRequest("No demo file provided".to_string()))?;
        if file.filename.trim().is_empty() {
            return Err(AppError::BadRequest("No file selected".to_string()));
        }

        let missing = missing_fields(&[
            ("artist_name", &form.artist_name),
            ("track_title", &form.track_title),
            ("email", &form.email),
            ("full_name", &form.full_name),
            ("instagram_username", &form.instagram_username),
        ]);
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }

        if !has_mp3_extension(&file.filename) {
            return Err(AppError::BadRequest(
                "Only MP3 files are allowed".to_string(),
            ));
        }
        if file.data.len() > self.max_demo_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Demo file exceeds the maximum size of {} MB",
                self.max_demo_size_bytes / (1024 * 1024)
            )));
        }

        let submission = submission_from_fields(
            &form.artist_name,
            &form.track_title,
            &form.email,
            &form.full_name,
            &form.instagram_username,
            &form.beatport,
            &form.facebook,
            &form.x_twitter,
        );
        if !is_valid_email(&submission.email) {
            return Err(AppError::BadRequest(
                "Invalid email address format".to_string(),
            ));
        }

        let demo_id = self
            .store
            .upload_demo(file.data, &submission, &submission_timestamp(Utc::now()))
            .await?;

        tracing::info!(demo_id = %demo_id, filename = %file.filename, "Demo relayed to storage");
        Ok(self.finish(&submission, demo_id).await)
    }

    async fn finish(&self, submission: &DemoSubmission, demo_id: String) -> SubmissionOutcome {
        let sent = self
            .mailer
            .send_demo_submission_confirmation(
                &submission.email,
                &submission.artist_name,
                &submission.track_title,
                &demo_id,
            )
            .await;

        if !sent {
            tracing::warn!(demo_id = %demo_id, "Confirmation email not sent");
        }

        SubmissionOutcome {
            demo_id,
            email_status: EmailStatus {
                confirmation_sent: sent,
                email_error: (!sent).then(|| EMAIL_FAILURE_MESSAGE.to_string()),
            },
        }
    }
}

fn missing_fields_error(missing: &[&str]) -> AppError {
    AppError::BadRequest(format!("Missing required fields: {}", missing.join(", ")))
}

#[allow(clippy::too_many_arguments)]
fn submission_from_fields(
    artist_name: &Option<String>,
    track_title: &Option<String>,
    email: &Option<String>,
    full_name: &Option<String>,
    instagram_username: &Option<String>,
    beatport: &Option<String>,
    facebook: &Option<String>,
    x_twitter: &Option<String>,
) -> DemoSubmission {
    let required = |v: &Option<String>| non_blank(v).unwrap_or_default().to_string();
    let optional = |v: &Option<String>| non_blank(v).map(String::from);
    DemoSubmission {
        artist_name: required(artist_name),
        track_title: required(track_title),
        email: required(email),
        full_name: required(full_name),
        instagram_username: required(instagram_username),
        beatport: optional(beatport),
        facebook: optional(facebook),
        x_twitter: optional(x_twitter),
    }
}
