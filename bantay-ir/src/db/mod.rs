//! Database access for bantay-ir
//!
//! One module per table. Functions take any SQLite executor so the same
//! query runs against the pool or inside a workflow transaction.

pub mod accidents;
pub mod concerns;
pub mod devices;
pub mod distributions;
pub mod history;
pub mod media;
pub mod users;

use bantay_common::{time, uuid_utils, Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// Read a required UUID column
pub(crate) fn uuid_col(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.try_get(column)?;
    uuid_utils::from_storage(&value)
}

/// Read a nullable UUID column
pub(crate) fn opt_uuid_col(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    uuid_utils::from_storage_opt(row.try_get(column)?)
}

/// Read a required RFC 3339 timestamp column
pub(crate) fn ts_col(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let value: String = row.try_get(column)?;
    time::from_storage(&value)
}

/// Read a nullable RFC 3339 timestamp column
pub(crate) fn opt_ts_col(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.try_get(column)?;
    value.as_deref().map(time::from_storage).transpose()
}

/// Read a closed-set column.
///
/// A value outside the set means the row was written by something other
/// than this service, so it surfaces as an internal error rather than a
/// validation error.
pub(crate) fn enum_col<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    let value: String = row.try_get(column)?;
    T::from_str(&value)
        .map_err(|e| Error::Internal(format!("Corrupt {} column: {}", column, e)))
}

pub(crate) fn opt_enum_col<T>(row: &SqliteRow, column: &str) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    let value: Option<String> = row.try_get(column)?;
    value
        .as_deref()
        .map(|v| {
            T::from_str(v).map_err(|e| Error::Internal(format!("Corrupt {} column: {}", column, e)))
        })
        .transpose()
}
