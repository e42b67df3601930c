//! Concern history (append-only)
//!
//! Entries are ordered by insertion (`rowid`), which is the commit order of
//! the transitions that wrote them.

use bantay_common::models::HistoryEntry;
use bantay_common::{time, Result};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{enum_col, ts_col, uuid_col};

fn entry_from_row(row: &SqliteRow) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: uuid_col(row, "id")?,
        concern_id: uuid_col(row, "concern_id")?,
        actor_id: uuid_col(row, "actor_id")?,
        previous_status: enum_col(row, "previous_status")?,
        status: enum_col(row, "status")?,
        remarks: row.try_get("remarks")?,
        created_at: ts_col(row, "created_at")?,
    })
}

pub async fn append_entry(executor: impl SqliteExecutor<'_>, entry: &HistoryEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO concern_history (id, concern_id, actor_id, previous_status, status,
                                     remarks, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(entry.concern_id.to_string())
    .bind(entry.actor_id.to_string())
    .bind(entry.previous_status.as_str())
    .bind(entry.status.as_str())
    .bind(&entry.remarks)
    .bind(time::to_storage(&entry.created_at))
    .execute(executor)
    .await?;

    Ok(())
}

/// Chronological history of one concern
pub async fn list_for_concern(
    executor: impl SqliteExecutor<'_>,
    concern_id: Uuid,
) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, concern_id, actor_id, previous_status, status, remarks, created_at
        FROM concern_history
        WHERE concern_id = ?
        ORDER BY rowid ASC
        "#,
    )
    .bind(concern_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter().map(entry_from_row).collect()
}
