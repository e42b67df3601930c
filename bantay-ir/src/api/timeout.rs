//! Request deadline middleware
//!
//! Requests still running after the limit are abandoned and answered with a
//! 408 in the standard envelope.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tracing::warn;

use crate::ApiError;

pub async fn timeout_middleware(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            warn!(%method, path = %path, limit_ms = limit.as_millis() as u64, "Request timed out");
            Err(ApiError::Timeout(limit))
        }
    }
}
