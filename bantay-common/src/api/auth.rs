//! Request signing via timestamp and shared-secret hash
//!
//! Every protected request carries `timestamp` (Unix epoch ms) and `hash`
//! (hex SHA-256). The hash covers the canonical JSON of the request document
//! with `hash` replaced by 64 zeros, followed by the shared secret in decimal.
//! JSON requests sign their body; other requests sign their query parameters.
//!
//! A shared secret of 0 disables checking.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

/// Settings key holding the shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";

/// Oldest acceptable request timestamp, relative to server time
pub const MAX_PAST_MS: i64 = 5_000;

/// Clock drift allowance for timestamps ahead of server time
pub const MAX_FUTURE_MS: i64 = 1_000;

const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Authentication error types
#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { timestamp: i64, now: i64, reason: String },

    /// Hash does not match calculated value
    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    /// Timestamp or hash missing from request
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Database error loading shared secret
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Failed to parse request document
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Load shared secret from database settings, generating one when absent
#[cfg(feature = "sqlx")]
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(Option<String>,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SHARED_SECRET_KEY)
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((Some(value),)) => value
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid shared secret: {}", e))),
        _ => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero shared secret
#[cfg(feature = "sqlx")]
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SHARED_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    tracing::info!("Generated new API shared secret");
    Ok(secret)
}

/// Current time in Unix epoch milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Validate timestamp against the server clock
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, now_millis())
}

/// Validate timestamp against an explicit `now`
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let diff = now - timestamp;

    if diff > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_MS),
        });
    }

    if diff < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Calculate the request hash
///
/// # Examples
///
/// ```
/// use bantay_common::api::auth::calculate_hash;
/// use serde_json::json;
///
/// let doc = json!({"status": "ongoing", "timestamp": 1730000000000i64, "hash": "x"});
/// let hash = calculate_hash(&doc, 123456789);
/// assert_eq!(hash.len(), 64);
/// ```
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(ZERO_HASH.to_string()));
    }

    let to_hash = format!("{}{}", to_canonical_json(&value), shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
///
/// # Examples
///
/// ```
/// use bantay_common::api::auth::to_canonical_json;
/// use serde_json::json;
///
/// assert_eq!(to_canonical_json(&json!({"z": 1, "a": [true, null]})), r#"{"a":[true,null],"z":1}"#);
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // serde_json escapes strings and formats numbers consistently
        other => other.to_string(),
    }
}

/// Validate hash matches calculated value
pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if !provided_hash.eq_ignore_ascii_case(&calculated) {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}

/// Extract and validate `timestamp`/`hash` from a signed document
pub fn validate_document(json_value: &Value, shared_secret: i64) -> Result<(), ApiAuthError> {
    let timestamp = match json_value.get("timestamp") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(ApiAuthError::MissingField("timestamp"))?;

    let hash = json_value
        .get("hash")
        .and_then(Value::as_str)
        .ok_or(ApiAuthError::MissingField("hash"))?;

    validate_timestamp(timestamp)?;
    validate_hash(hash, json_value, shared_secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_window() {
        let now = 1_800_000_000_000;
        assert!(validate_timestamp_at(now, now).is_ok());
        assert!(validate_timestamp_at(now - MAX_PAST_MS, now).is_ok());
        assert!(validate_timestamp_at(now - MAX_PAST_MS - 1, now).is_err());
        assert!(validate_timestamp_at(now + MAX_FUTURE_MS, now).is_ok());
        assert!(validate_timestamp_at(now + MAX_FUTURE_MS + 1, now).is_err());
    }

    #[test]
    fn test_hash_ignores_provided_hash_value() {
        let a = json!({"status": "resolved", "timestamp": 1, "hash": "abc"});
        let b = json!({"status": "resolved", "timestamp": 1, "hash": "def"});
        assert_eq!(calculate_hash(&a, 42), calculate_hash(&b, 42));
    }

    #[test]
    fn test_hash_depends_on_secret_and_content() {
        let doc = json!({"status": "resolved", "timestamp": 1});
        assert_ne!(calculate_hash(&doc, 1), calculate_hash(&doc, 2));
        let other = json!({"status": "ongoing", "timestamp": 1});
        assert_ne!(calculate_hash(&doc, 1), calculate_hash(&other, 1));
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let doc = json!({"b": {"y": 1, "x": 2}, "a": "q\"uote"});
        assert_eq!(to_canonical_json(&doc), r#"{"a":"q\"uote","b":{"x":2,"y":1}}"#);
    }

    #[test]
    fn test_validate_document_roundtrip() {
        let secret = 987_654_321;
        let mut doc = json!({"remarks": "Responding now", "timestamp": now_millis()});
        let hash = calculate_hash(&doc, secret);
        doc["hash"] = json!(hash);
        assert!(validate_document(&doc, secret).is_ok());
        assert!(matches!(
            validate_document(&doc, secret + 1),
            Err(ApiAuthError::InvalidHash { .. })
        ));
    }

    #[test]
    fn test_validate_document_missing_fields() {
        let doc = json!({"hash": "00"});
        assert!(matches!(
            validate_document(&doc, 1),
            Err(ApiAuthError::MissingField("timestamp"))
        ));
        let doc = json!({"timestamp": now_millis()});
        assert!(matches!(validate_document(&doc, 1), Err(ApiAuthError::MissingField("hash"))));
    }

    #[test]
    fn test_query_style_string_timestamp_accepted() {
        let secret = 5;
        let mut doc = json!({"device_id": "cam-1", "timestamp": now_millis().to_string()});
        let hash = calculate_hash(&doc, secret);
        doc["hash"] = json!(hash);
        assert!(validate_document(&doc, secret).is_ok());
    }
}
