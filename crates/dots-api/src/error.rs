//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>` for the submission
//! endpoints and `Result<impl IntoResponse, ResourceError>` for the read
//! endpoints. Both render a JSON body with at least an `error` field.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dots_core::{AppError, ErrorMetadata, LogLevel};
use dots_infra::ErrorResponse;
use serde::de::DeserializeOwned;

/// Wrapper type for AppError to implement IntoResponse
///
/// The orphan rule forbids implementing axum's `IntoResponse` for the core
/// error type directly.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

fn status_of(error: &AppError) -> StatusCode {
    StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        log_error(app_error);

        let mut body = ErrorResponse::new(app_error.client_message())
            .with_code(app_error.error_code())
            .with_retry_hint(app_error.is_recoverable(), app_error.suggested_action());
        if !is_production_env() && !app_error.is_sensitive() {
            body = body.with_details(app_error.detailed_message());
        }

        (status_of(app_error), Json(body)).into_response()
    }
}

/// The read-only content endpoints, each with its own error titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResource {
    Artists,
    Events,
    Playlist,
    Videos,
}

impl ReadResource {
    fn invalid_title(self) -> &'static str {
        match self {
            ReadResource::Playlist => "Invalid playlist URL",
            _ => "Invalid data format",
        }
    }

    fn not_found_title(self) -> Option<&'static str> {
        match self {
            ReadResource::Artists => Some("Artist data file not found"),
            ReadResource::Events => Some("Events data file not found"),
            ReadResource::Playlist | ReadResource::Videos => None,
        }
    }

    fn failure_title(self) -> &'static str {
        match self {
            ReadResource::Artists => "Failed to retrieve artist data",
            ReadResource::Events => "Failed to retrieve events data",
            ReadResource::Playlist => "Failed to retrieve playlist data",
            ReadResource::Videos => "Failed to fetch YouTube videos",
        }
    }
}

/// Read-endpoint failure: `{"error": <category title>, "message": <detail>}`.
#[derive(Debug)]
pub struct ResourceError {
    pub resource: ReadResource,
    pub error: AppError,
}

impl ResourceError {
    pub fn new(resource: ReadResource, error: AppError) -> Self {
        Self { resource, error }
    }

    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match &self.error {
            AppError::InvalidInput(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.resource.invalid_title())
            }
            AppError::NotFound(_) => match self.resource.not_found_title() {
                Some(title) => (StatusCode::NOT_FOUND, title),
                None => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    self.resource.failure_title(),
                ),
            },
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                self.resource.failure_title(),
            ),
        }
    }
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        log_error(&self.error);
        let (status, title) = self.status_and_title();

        (
            status,
            Json(serde_json::json!({
                "error": title,
                "message": self.error.client_message(),
            })),
        )
            .into_response()
    }
}
