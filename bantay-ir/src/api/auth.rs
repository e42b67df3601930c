//! Request signing middleware
//!
//! JSON requests are signed over their body; every other request (GET,
//! DELETE, multipart uploads) is signed over its query parameters. Failures
//! are 401 with the standard envelope. A shared secret of 0 disables the
//! check.

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header::CONTENT_TYPE, Uri},
    middleware::Next,
    response::Response,
};
use bantay_common::api::auth::{validate_document, ApiAuthError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use crate::{ApiError, AppState};

/// Largest JSON body the middleware will buffer for hashing
const MAX_SIGNED_BODY_BYTES: usize = 1024 * 1024;

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if !is_json {
        let document = query_document(request.uri());
        check(&document, state.shared_secret)?;
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_SIGNED_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read body: {}", e)))?;

    let document: Value = serde_json::from_slice(&body_bytes)
        .map_err(|e| ApiError::validation(format!("Invalid JSON: {}", e)))?;
    check(&document, state.shared_secret)?;

    // Restore the body for the handler
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

/// Query parameters as a flat JSON object of strings
fn query_document(uri: &Uri) -> Value {
    let pairs = Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();
    Value::Object(
        pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

fn check(document: &Value, shared_secret: i64) -> Result<(), ApiError> {
    validate_document(document, shared_secret).map_err(|e| {
        match &e {
            ApiAuthError::InvalidHash { provided, calculated } => {
                warn!(
                    "Hash validation failed: provided={}, calculated={}",
                    provided, calculated
                );
            }
            other => warn!("Request authentication failed: {}", other),
        }
        ApiError::Unauthorized(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_document() {
        let uri: Uri = "/api/concerns?status=in_progress&timestamp=17&hash=ab%20c"
            .parse()
            .unwrap();
        let doc = query_document(&uri);
        assert_eq!(doc["status"], "in_progress");
        assert_eq!(doc["timestamp"], "17");
        assert_eq!(doc["hash"], "ab c");
    }

    #[test]
    fn test_empty_query() {
        let uri: Uri = "/api/concerns".parse().unwrap();
        assert_eq!(query_document(&uri), Value::Object(Map::new()));
    }

    #[test]
    fn test_missing_signature_is_unauthorized() {
        let uri: Uri = "/api/distributions".parse().unwrap();
        let result = check(&query_document(&uri), 42);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
