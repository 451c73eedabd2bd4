//! HTTP error response body
//!
//! `IntoResponse` for `AppError` lives in `dots-api`: the orphan rule forbids
//! implementing axum's trait for the core error type here.

use serde::Serialize;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Whether the same request may succeed if retried
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            details: None,
            recoverable: false,
            suggested_action: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retry_hint(mut self, recoverable: bool, suggested_action: Option<&str>) -> Self {
        self.recoverable = recoverable;
        self.suggested_action = suggested_action.map(String::from);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let body = serde_json::to_value(ErrorResponse::new("Invalid file path")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "Invalid file path", "recoverable": false})
        );

        let body = serde_json::to_value(
            ErrorResponse::new("Bad")
                .with_code("BAD_REQUEST")
                .with_details("missing field")
                .with_retry_hint(true, Some("Retry after a short delay")),
        )
        .unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["details"], "missing field");
        assert_eq!(body["recoverable"], true);
        assert_eq!(body["suggested_action"], "Retry after a short delay");
    }
}
