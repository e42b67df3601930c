//! Common error types for Bantay

use thiserror::Error;

/// Common result type for Bantay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Bantay services
///
/// The workflow taxonomy maps onto these variants:
/// - `NotFoundOrUnauthorized`: lookups that must not reveal whether a record exists
/// - `Validation`: bad enum values, malformed coordinates, rejected uploads
/// - `Database` / `Io` / `Internal`: persistence failures (the unit of work is rolled back)
/// - `Upstream`: SMS, email or classifier failures (never fatal to the triggering request)
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record absent, or present but not visible to the requesting actor
    #[error("Not found: {0}")]
    NotFoundOrUnauthorized(String),

    /// Invalid user input or request parameter
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request conflicts with existing state (e.g. concern already assigned)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Optimistic version check failed; the unit of work may be retried
    #[error("Concurrent modification: {0}")]
    Stale(String),

    /// External integration (SMS gateway, email API, AI classifier) failed
    #[error("Upstream integration error: {0}")]
    Upstream(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for SQLite lock/busy errors and stale versions, which are worth retrying
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Error::Database(db_err) => {
                let msg = db_err.to_string();
                msg.contains("database is locked") || msg.contains("database is busy")
            }
            Error::Stale(_) => true,
            _ => false,
        }
    }

    /// True when a database constraint rejected a duplicate key
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
