//! Concern rows
//!
//! Status changes go through `update_status_versioned`, which applies the
//! optimistic version check. Soft-deleted rows are excluded from every
//! lookup except `get_concern_including_deleted`.

use bantay_common::models::{Concern, ConcernStatus, GeoPoint};
use bantay_common::{time, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{enum_col, opt_enum_col, opt_ts_col, opt_uuid_col, ts_col, uuid_col};

const CONCERN_COLUMNS: &str = r#"
    c.id, c.tracking_code, c.origin, c.category, c.severity, c.status,
    c.latitude, c.longitude, c.title, c.description, c.submitted_by,
    c.version, c.created_at, c.updated_at, c.deleted_at
"#;

pub(crate) fn concern_from_row(row: &SqliteRow) -> Result<Concern> {
    Ok(Concern {
        id: uuid_col(row, "id")?,
        tracking_code: row.try_get("tracking_code")?,
        origin: enum_col(row, "origin")?,
        category: enum_col(row, "category")?,
        severity: opt_enum_col(row, "severity")?,
        status: enum_col(row, "status")?,
        location: GeoPoint::from_parts(row.try_get("latitude")?, row.try_get("longitude")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        submitted_by: opt_uuid_col(row, "submitted_by")?,
        version: row.try_get("version")?,
        created_at: ts_col(row, "created_at")?,
        updated_at: ts_col(row, "updated_at")?,
        deleted_at: opt_ts_col(row, "deleted_at")?,
    })
}

pub async fn insert_concern(executor: impl SqliteExecutor<'_>, concern: &Concern) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO concerns (id, tracking_code, origin, category, severity, status,
                              latitude, longitude, title, description, submitted_by,
                              version, created_at, updated_at, deleted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(concern.id.to_string())
    .bind(&concern.tracking_code)
    .bind(concern.origin.as_str())
    .bind(concern.category.as_str())
    .bind(concern.severity.map(|s| s.as_str()))
    .bind(concern.status.as_str())
    .bind(concern.location.map(|p| p.latitude))
    .bind(concern.location.map(|p| p.longitude))
    .bind(&concern.title)
    .bind(&concern.description)
    .bind(concern.submitted_by.map(|id| id.to_string()))
    .bind(concern.version)
    .bind(time::to_storage(&concern.created_at))
    .bind(time::to_storage(&concern.updated_at))
    .bind(concern.deleted_at.as_ref().map(time::to_storage))
    .execute(executor)
    .await?;

    Ok(())
}

/// Live (not soft-deleted) concern by id
pub async fn get_concern(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<Concern>> {
    let sql = format!(
        "SELECT {} FROM concerns c WHERE c.id = ? AND c.deleted_at IS NULL",
        CONCERN_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(concern_from_row).transpose()
}

pub async fn get_concern_including_deleted(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
) -> Result<Option<Concern>> {
    let sql = format!("SELECT {} FROM concerns c WHERE c.id = ?", CONCERN_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(concern_from_row).transpose()
}

pub async fn get_by_tracking_code(
    executor: impl SqliteExecutor<'_>,
    tracking_code: &str,
) -> Result<Option<Concern>> {
    let sql = format!(
        "SELECT {} FROM concerns c WHERE c.tracking_code = ? AND c.deleted_at IS NULL",
        CONCERN_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(tracking_code)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(concern_from_row).transpose()
}

/// Concerns distributed to `handler_id`, optionally filtered by distribution status
pub async fn list_for_handler(
    executor: impl SqliteExecutor<'_>,
    handler_id: Uuid,
    status: Option<bantay_common::models::DistributionStatus>,
) -> Result<Vec<Concern>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM concerns c
        JOIN distributions d ON d.concern_id = c.id
        WHERE d.handler_id = ?
          AND c.deleted_at IS NULL
          AND (? IS NULL OR d.status = ?)
        ORDER BY c.created_at DESC
        "#,
        CONCERN_COLUMNS
    );
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query(&sql)
        .bind(handler_id.to_string())
        .bind(status)
        .bind(status)
        .fetch_all(executor)
        .await?;

    rows.iter().map(concern_from_row).collect()
}

/// Set a new status if the row still carries `expected_version`.
///
/// Returns false when another writer got there first (or the concern was
/// deleted meanwhile); the caller treats that as a stale read.
pub async fn update_status_versioned(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    expected_version: i64,
    status: ConcernStatus,
    updated_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE concerns
        SET status = ?, version = version + 1, updated_at = ?
        WHERE id = ? AND version = ? AND deleted_at IS NULL
        "#,
    )
    .bind(status.as_str())
    .bind(time::to_storage(&updated_at))
    .bind(id.to_string())
    .bind(expected_version)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Returns false when the concern does not exist or is already deleted
pub async fn soft_delete(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    deleted_at: DateTime<Utc>,
) -> Result<bool> {
    let stamp = time::to_storage(&deleted_at);
    let result = sqlx::query(
        r#"
        UPDATE concerns
        SET deleted_at = ?, updated_at = ?, version = version + 1
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&stamp)
    .bind(&stamp)
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}
