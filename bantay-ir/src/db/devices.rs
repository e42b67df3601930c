//! Registered detection devices

use bantay_common::models::{Device, GeoPoint};
use bantay_common::{time, Result};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{opt_uuid_col, ts_col, uuid_col};

fn device_from_row(row: &SqliteRow) -> Result<Device> {
    let enabled: i64 = row.try_get("enabled")?;
    Ok(Device {
        id: uuid_col(row, "id")?,
        name: row.try_get("name")?,
        location_label: row.try_get("location_label")?,
        location: GeoPoint::from_parts(row.try_get("latitude")?, row.try_get("longitude")?)?,
        enabled: enabled != 0,
        default_handler_id: opt_uuid_col(row, "default_handler_id")?,
        created_at: ts_col(row, "created_at")?,
    })
}

pub async fn insert_device(executor: impl SqliteExecutor<'_>, device: &Device) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO devices (id, name, location_label, latitude, longitude, enabled,
                             default_handler_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(device.id.to_string())
    .bind(&device.name)
    .bind(&device.location_label)
    .bind(device.location.map(|p| p.latitude))
    .bind(device.location.map(|p| p.longitude))
    .bind(device.enabled as i64)
    .bind(device.default_handler_id.map(|id| id.to_string()))
    .bind(time::to_storage(&device.created_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_device(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<Device>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, location_label, latitude, longitude, enabled,
               default_handler_id, created_at
        FROM devices WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(device_from_row).transpose()
}

/// Returns false when no device has this id
pub async fn set_enabled(executor: impl SqliteExecutor<'_>, id: Uuid, enabled: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE devices SET enabled = ? WHERE id = ?")
        .bind(enabled as i64)
        .bind(id.to_string())
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
