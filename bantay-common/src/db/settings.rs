//! Settings database operations
//!
//! Runtime tunables live in the `settings` key-value table. Every key read by
//! the services is listed in [`DEFAULT_SETTINGS`] and gets its default at
//! startup.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{Error, Result};

/// Maximum delivery attempts per notification handler
pub const NOTIFY_MAX_ATTEMPTS: &str = "notify_max_attempts";
/// Fixed delay between notification attempts
pub const NOTIFY_RETRY_BACKOFF_MS: &str = "notify_retry_backoff_ms";
/// Minimum detector confidence for an emergency label to count
pub const DETECTION_CONFIDENCE_THRESHOLD: &str = "detection_confidence_threshold";
/// Upper bound on uploaded snapshot size
pub const INGEST_MAX_IMAGE_BYTES: &str = "ingest_max_image_bytes";
/// Total time a unit of work may spend retrying lock contention
pub const DB_MAX_LOCK_WAIT_MS: &str = "db_max_lock_wait_ms";
/// Attempts at generating an unused tracking code
pub const TRACKING_CODE_MAX_ATTEMPTS: &str = "tracking_code_max_attempts";

/// Defaults ensured at startup
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    (NOTIFY_MAX_ATTEMPTS, "3"),
    (NOTIFY_RETRY_BACKOFF_MS, "2000"),
    (DETECTION_CONFIDENCE_THRESHOLD, "0.5"),
    (INGEST_MAX_IMAGE_BYTES, "10485760"),
    (DB_MAX_LOCK_WAIT_MS, "5000"),
    (TRACKING_CODE_MAX_ATTEMPTS, "5"),
];

/// Initialize or repair default settings
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    for (key, value) in DEFAULT_SETTINGS {
        ensure_setting(pool, key, value).await?;
    }
    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        None => {
            // INSERT OR IGNORE: several processes may initialize concurrently
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}

/// Read and parse a setting; `None` when absent
pub async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((Some(value),)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Setting '{}' = '{}': {}", key, value, e)))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

/// Read a setting, falling back to its compiled default
pub async fn get_setting_or<T>(pool: &SqlitePool, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_setting(pool, key).await?.unwrap_or(default))
}

/// Insert or replace a setting
pub async fn set_setting<T>(pool: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Runtime tunables read together by the services
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub notify_max_attempts: u32,
    pub notify_retry_backoff_ms: u64,
    pub detection_confidence_threshold: f32,
    pub ingest_max_image_bytes: usize,
    pub db_max_lock_wait_ms: u64,
    pub tracking_code_max_attempts: u32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            notify_max_attempts: 3,
            notify_retry_backoff_ms: 2000,
            detection_confidence_threshold: 0.5,
            ingest_max_image_bytes: 10 * 1024 * 1024,
            db_max_lock_wait_ms: 5000,
            tracking_code_max_attempts: 5,
        }
    }
}

impl RuntimeSettings {
    /// Load every tunable, defaulting missing keys
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let d = Self::default();
        let settings = Self {
            notify_max_attempts: get_setting_or(pool, NOTIFY_MAX_ATTEMPTS, d.notify_max_attempts)
                .await?
                .max(1),
            notify_retry_backoff_ms: get_setting_or(
                pool,
                NOTIFY_RETRY_BACKOFF_MS,
                d.notify_retry_backoff_ms,
            )
            .await?,
            detection_confidence_threshold: get_setting_or(
                pool,
                DETECTION_CONFIDENCE_THRESHOLD,
                d.detection_confidence_threshold,
            )
            .await?,
            ingest_max_image_bytes: get_setting_or(
                pool,
                INGEST_MAX_IMAGE_BYTES,
                d.ingest_max_image_bytes,
            )
            .await?,
            db_max_lock_wait_ms: get_setting_or(pool, DB_MAX_LOCK_WAIT_MS, d.db_max_lock_wait_ms)
                .await?,
            tracking_code_max_attempts: get_setting_or(
                pool,
                TRACKING_CODE_MAX_ATTEMPTS,
                d.tracking_code_max_attempts,
            )
            .await?
            .max(1),
        };

        if !(0.0..=1.0).contains(&settings.detection_confidence_threshold) {
            return Err(Error::Config(format!(
                "{} must be within [0, 1], got {}",
                DETECTION_CONFIDENCE_THRESHOLD, settings.detection_confidence_threshold
            )));
        }

        Ok(settings)
    }
}
