//! Error types for bantay-ir
//!
//! Every failure leaves the service as the standard response envelope.
//! Persistence and internal failures are logged in full and reported with a
//! generic message.

use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bantay_common::api::ApiResponse;
use bantay_common::Error;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown actor, or failed request signature (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Body could not be read at all (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request exceeded its deadline (408)
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Domain or persistence error
    #[error(transparent)]
    Common(#[from] Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Common(Error::Validation(msg.into()))
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Timeout(limit) => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                format!("Request did not complete within {} ms", limit.as_millis()),
            ),
            ApiError::Common(err) => match err {
                Error::NotFoundOrUnauthorized(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                Error::Validation(msg) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg.clone())
                }
                Error::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                Error::Stale(_) => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "Concern was modified concurrently, please retry".to_string(),
                ),
                Error::Upstream(_) => (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An external service is unavailable".to_string(),
                ),
                Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        }

        let body = ApiResponse::failure(message, json!({ "code": code }));
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::validation(e.body_text()),
            JsonRejection::JsonSyntaxError(e) => ApiError::validation(e.body_text()),
            JsonRejection::MissingJsonContentType(e) => ApiError::BadRequest(e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
