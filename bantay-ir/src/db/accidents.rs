//! Accident reports

use bantay_common::models::{Accident, GeoPoint};
use bantay_common::{time, Result};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{opt_ts_col, opt_uuid_col, ts_col, uuid_col};

fn accident_from_row(row: &SqliteRow) -> Result<Accident> {
    Ok(Accident {
        id: uuid_col(row, "id")?,
        concern_id: opt_uuid_col(row, "concern_id")?,
        reported_by: opt_uuid_col(row, "reported_by")?,
        description: row.try_get("description")?,
        location: GeoPoint::from_parts(row.try_get("latitude")?, row.try_get("longitude")?)?,
        occurred_at: opt_ts_col(row, "occurred_at")?,
        created_at: ts_col(row, "created_at")?,
    })
}

pub async fn insert_accident(executor: impl SqliteExecutor<'_>, accident: &Accident) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accidents (id, concern_id, reported_by, description, latitude, longitude,
                               occurred_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(accident.id.to_string())
    .bind(accident.concern_id.map(|id| id.to_string()))
    .bind(accident.reported_by.map(|id| id.to_string()))
    .bind(&accident.description)
    .bind(accident.location.map(|p| p.latitude))
    .bind(accident.location.map(|p| p.longitude))
    .bind(accident.occurred_at.as_ref().map(time::to_storage))
    .bind(time::to_storage(&accident.created_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_accident(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<Accident>> {
    let row = sqlx::query(
        r#"
        SELECT id, concern_id, reported_by, description, latitude, longitude,
               occurred_at, created_at
        FROM accidents WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(accident_from_row).transpose()
}
