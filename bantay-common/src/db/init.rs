//! Database initialization
//!
//! Creates the SQLite database on first run, applies connection pragmas to
//! every pooled connection, creates the schema idempotently and ensures every
//! runtime setting has a value.

use crate::models::{
    ActorRole, Category, ConcernStatus, DistributionStatus, MediaCategory, MediaKind,
    MediaSourceKind, OriginType, Severity,
};
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::settings::init_default_settings;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas go on the connect options so each pooled connection gets them,
    // not just the one that happens to run a PRAGMA statement.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(250));

    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create all tables, indexes and guard triggers (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_devices_table(pool).await?;
    create_concerns_table(pool).await?;
    create_distributions_table(pool).await?;
    create_history_table(pool).await?;
    create_accidents_table(pool).await?;
    create_media_table(pool).await?;
    Ok(())
}

/// `CHECK` clause restricting a column to a closed set
fn check_in<'a>(column: &str, values: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = values.into_iter().map(|v| format!("'{}'", v)).collect();
    format!("CHECK ({} IN ({}))", column, quoted.join(", "))
}

async fn execute(pool: &SqlitePool, sql: &str) -> Result<()> {
    sqlx::query(sql).execute(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores runtime configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    execute(
        pool,
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL {role_check},
            phone TEXT,
            email TEXT,
            purok TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        role_check = check_in("role", ActorRole::ALL.iter().map(|r| r.as_str())),
    );
    execute(pool, &sql).await
}

async fn create_devices_table(pool: &SqlitePool) -> Result<()> {
    execute(
        pool,
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            location_label TEXT,
            latitude REAL,
            longitude REAL,
            enabled INTEGER NOT NULL DEFAULT 1,
            default_handler_id TEXT REFERENCES users(id),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .await
}

async fn create_concerns_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS concerns (
            id TEXT PRIMARY KEY,
            tracking_code TEXT NOT NULL UNIQUE,
            origin TEXT NOT NULL {origin_check},
            category TEXT NOT NULL {category_check},
            severity TEXT CHECK (severity IS NULL OR severity IN ({severities})),
            status TEXT NOT NULL {status_check},
            latitude REAL,
            longitude REAL,
            title TEXT NOT NULL,
            description TEXT,
            submitted_by TEXT REFERENCES users(id),
            version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
        origin_check = check_in("origin", OriginType::ALL.iter().map(|v| v.as_str())),
        category_check = check_in("category", Category::ALL.iter().map(|v| v.as_str())),
        severities = Severity::ALL
            .iter()
            .map(|v| format!("'{}'", v.as_str()))
            .collect::<Vec<_>>()
            .join(", "),
        status_check = check_in("status", ConcernStatus::ALL.iter().map(|v| v.as_str())),
    );
    execute(pool, &sql).await?;

    // Concerns are soft-deleted only
    execute(
        pool,
        r#"
        CREATE TRIGGER IF NOT EXISTS concerns_no_delete
        BEFORE DELETE ON concerns
        BEGIN
            SELECT RAISE(ABORT, 'concerns are soft-deleted only');
        END
        "#,
    )
    .await
}

async fn create_distributions_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS distributions (
            id TEXT PRIMARY KEY,
            concern_id TEXT NOT NULL UNIQUE REFERENCES concerns(id),
            handler_id TEXT NOT NULL REFERENCES users(id),
            status TEXT NOT NULL {status_check},
            assigned_at TEXT NOT NULL,
            acknowledged_at TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
        status_check = check_in("status", DistributionStatus::ALL.iter().map(|v| v.as_str())),
    );
    execute(pool, &sql).await?;

    execute(
        pool,
        "CREATE INDEX IF NOT EXISTS idx_distributions_handler ON distributions(handler_id, status)",
    )
    .await
}

async fn create_history_table(pool: &SqlitePool) -> Result<()> {
    let statuses = || ConcernStatus::ALL.iter().map(|v| v.as_str());
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS concern_history (
            id TEXT PRIMARY KEY,
            concern_id TEXT NOT NULL REFERENCES concerns(id),
            actor_id TEXT NOT NULL,
            previous_status TEXT NOT NULL {previous_check},
            status TEXT NOT NULL {status_check},
            remarks TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        previous_check = check_in("previous_status", statuses()),
        status_check = check_in("status", statuses()),
    );
    execute(pool, &sql).await?;

    execute(
        pool,
        "CREATE INDEX IF NOT EXISTS idx_concern_history_concern ON concern_history(concern_id)",
    )
    .await?;

    // Append-only ledger
    execute(
        pool,
        r#"
        CREATE TRIGGER IF NOT EXISTS concern_history_no_update
        BEFORE UPDATE ON concern_history
        BEGIN
            SELECT RAISE(ABORT, 'concern_history is append-only');
        END
        "#,
    )
    .await?;
    execute(
        pool,
        r#"
        CREATE TRIGGER IF NOT EXISTS concern_history_no_delete
        BEFORE DELETE ON concern_history
        BEGIN
            SELECT RAISE(ABORT, 'concern_history is append-only');
        END
        "#,
    )
    .await
}

async fn create_accidents_table(pool: &SqlitePool) -> Result<()> {
    execute(
        pool,
        r#"
        CREATE TABLE IF NOT EXISTS accidents (
            id TEXT PRIMARY KEY,
            concern_id TEXT REFERENCES concerns(id),
            reported_by TEXT REFERENCES users(id),
            description TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            occurred_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .await
}

async fn create_media_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS incident_media (
            id TEXT PRIMARY KEY,
            source_type TEXT NOT NULL {source_check},
            source_id TEXT NOT NULL,
            category TEXT NOT NULL {category_check},
            kind TEXT NOT NULL {kind_check},
            storage_path TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            byte_size INTEGER NOT NULL,
            sha256 TEXT NOT NULL,
            detection TEXT,
            false_alarm INTEGER NOT NULL DEFAULT 0,
            captured_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        source_check = check_in("source_type", MediaSourceKind::ALL.iter().map(|v| v.as_str())),
        category_check = check_in("category", MediaCategory::ALL.iter().map(|v| v.as_str())),
        kind_check = check_in("kind", MediaKind::ALL.iter().map(|v| v.as_str())),
    );
    execute(pool, &sql).await?;

    execute(
        pool,
        "CREATE INDEX IF NOT EXISTS idx_incident_media_source ON incident_media(source_type, source_id)",
    )
    .await?;

    // Media is immutable after ingestion
    execute(
        pool,
        r#"
        CREATE TRIGGER IF NOT EXISTS incident_media_no_update
        BEFORE UPDATE ON incident_media
        BEGIN
            SELECT RAISE(ABORT, 'incident_media is immutable');
        END
        "#,
    )
    .await
}
