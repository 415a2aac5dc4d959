//! API error taxonomy.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl maps
//! each variant onto the status code the client contract expects and a JSON
//! `{"error": "..."}` body.
//!
//! This taxonomy covers handler-level failures only. A body that fails to
//! deserialize at all (malformed JSON, a wrong-typed field, an unknown enum
//! value) is rejected by axum's `Json` extractor with 422 before any handler
//! runs; `Validation` (400) is for requests that parse but carry missing or
//! out-of-range values.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type alias for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request fields. Client-correctable, no partial
    /// write has been attempted.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Missing or expired session, or a bad dispatch secret.
    #[error("Unauthorized")]
    Unauthorized,

    /// A uniqueness constraint was violated (e.g. duplicate email).
    #[error("{0}")]
    Conflict(&'static str),

    /// Push delivery is not configured on this deployment.
    #[error("Push delivery is not configured")]
    PushNotConfigured,

    /// The delivery collaborator could not be reached at all.
    #[error("Push delivery failed: {0}")]
    Delivery(String),
}

impl ApiError {
    /// Convenience constructor for missing-field errors.
    pub fn missing(fields: &str) -> Self {
        Self::Validation(format!("{fields} required"))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PushNotConfigured | Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("entry").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Conflict("duplicate").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::PushNotConfigured.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_message() {
        let err = ApiError::missing("user_id is");
        assert_eq!(err.to_string(), "user_id is required");
    }
}
