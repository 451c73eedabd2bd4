//! Demo submission endpoints: upload link, upload confirmation and relay.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::ip_extraction::ClientIp;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use dots_core::models::{
    ConfirmUploadRequest, DemoFile, RelayForm, SubmissionResponse, UploadLinkRequest,
};
use dots_core::AppError;
use std::sync::Arc;

/// Multipart field carrying the audio file.
const DEMO_FILE_FIELD: &str = "demo_file";

#[tracing::instrument(skip(state, request), fields(operation = "get_upload_link"))]
pub async fn get_upload_link(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<UploadLinkRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state
        .submissions
        .issue_upload_link(request, client_ip.as_deref())
        .await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state, request), fields(operation = "confirm_demo_upload"))]
pub async fn confirm_demo_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ConfirmUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state.submissions.confirm_upload(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse::new(
            "Demo submission confirmed successfully",
            outcome,
        )),
    ))
}

#[tracing::instrument(skip(state, multipart), fields(operation = "submit_demo"))]
pub async fn submit_demo(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (form, file) = read_demo_form(multipart).await?;
    let outcome = state
        .submissions
        .relay_submission(form, file, client_ip.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse::new("Demo submitted successfully", outcome)),
    ))
}

/// Split the relay form into its text fields and the optional audio file.
async fn read_demo_form(
    mut multipart: Multipart,
) -> Result<(RelayForm, Option<DemoFile>), AppError> {
    let mut form = RelayForm::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if name == DEMO_FILE_FIELD {
            let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let data = field.bytes().await.map_err(multipart_error)?;
            file = Some(DemoFile {
                filename,
                data: data.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.set_field(&name, value);
        }
    }

    Ok((form, file))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Demo file exceeds the maximum upload size".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart form: {}", err.body_text()))
    }
}
