//! Shared API request/response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope used by every JSON endpoint
///
/// Failures carry `success: false`, a user-facing message and an optional
/// machine-readable error code. Internal details are logged, never returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>, error: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_envelope_omits_error() {
        let json = serde_json::to_value(ApiResponse::ok("Done", json!({"id": 1}))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_envelope_omits_data() {
        let json =
            serde_json::to_value(ApiResponse::failure("Not found", json!({"code": "NOT_FOUND"})))
                .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json.get("data").is_none());
    }
}
