//! Distribution rows (concern → handler binding)

use bantay_common::models::{Distribution, DistributionStatus};
use bantay_common::{time, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use uuid::Uuid;

use super::{enum_col, opt_ts_col, ts_col, uuid_col};

fn distribution_from_row(row: &SqliteRow) -> Result<Distribution> {
    Ok(Distribution {
        id: uuid_col(row, "id")?,
        concern_id: uuid_col(row, "concern_id")?,
        handler_id: uuid_col(row, "handler_id")?,
        status: enum_col(row, "status")?,
        assigned_at: ts_col(row, "assigned_at")?,
        acknowledged_at: opt_ts_col(row, "acknowledged_at")?,
        updated_at: ts_col(row, "updated_at")?,
    })
}

/// Fails with a unique violation if the concern is already distributed
pub async fn insert_distribution(
    executor: impl SqliteExecutor<'_>,
    distribution: &Distribution,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO distributions (id, concern_id, handler_id, status, assigned_at,
                                   acknowledged_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(distribution.id.to_string())
    .bind(distribution.concern_id.to_string())
    .bind(distribution.handler_id.to_string())
    .bind(distribution.status.as_str())
    .bind(time::to_storage(&distribution.assigned_at))
    .bind(distribution.acknowledged_at.as_ref().map(time::to_storage))
    .bind(time::to_storage(&distribution.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_for_concern(
    executor: impl SqliteExecutor<'_>,
    concern_id: Uuid,
) -> Result<Option<Distribution>> {
    let row = sqlx::query(
        r#"
        SELECT id, concern_id, handler_id, status, assigned_at, acknowledged_at, updated_at
        FROM distributions WHERE concern_id = ?
        "#,
    )
    .bind(concern_id.to_string())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(distribution_from_row).transpose()
}

/// Write the mapped status; `acknowledged_at` is stamped only if still unset
pub async fn update_status(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    status: DistributionStatus,
    acknowledge: bool,
    updated_at: DateTime<Utc>,
) -> Result<()> {
    let stamp = time::to_storage(&updated_at);
    sqlx::query(
        r#"
        UPDATE distributions
        SET status = ?,
            acknowledged_at = CASE WHEN ? THEN COALESCE(acknowledged_at, ?) ELSE acknowledged_at END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(acknowledge)
    .bind(&stamp)
    .bind(&stamp)
    .bind(id.to_string())
    .execute(executor)
    .await?;

    Ok(())
}
