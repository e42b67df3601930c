//! Incident media rows (immutable after insert)

use bantay_common::models::{DetectionMetadata, IncidentMedia, MediaSource, MediaSourceKind};
use bantay_common::{time, Error, Result};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{enum_col, opt_ts_col, ts_col, uuid_col};

fn media_from_row(row: &SqliteRow) -> Result<IncidentMedia> {
    let source_kind: MediaSourceKind = enum_col(row, "source_type")?;
    let detection: Option<String> = row.try_get("detection")?;
    let detection = detection
        .map(|json| {
            serde_json::from_str::<DetectionMetadata>(&json)
                .map_err(|e| Error::Internal(format!("Failed to deserialize detection: {}", e)))
        })
        .transpose()?;
    let false_alarm: i64 = row.try_get("false_alarm")?;

    Ok(IncidentMedia {
        id: uuid_col(row, "id")?,
        source: MediaSource::from_parts(source_kind, uuid_col(row, "source_id")?),
        category: enum_col(row, "category")?,
        kind: enum_col(row, "kind")?,
        storage_path: row.try_get("storage_path")?,
        mime_type: row.try_get("mime_type")?,
        byte_size: row.try_get("byte_size")?,
        sha256: row.try_get("sha256")?,
        detection,
        false_alarm: false_alarm != 0,
        captured_at: opt_ts_col(row, "captured_at")?,
        created_at: ts_col(row, "created_at")?,
    })
}

pub async fn insert_media(executor: impl SqliteExecutor<'_>, media: &IncidentMedia) -> Result<()> {
    let detection = media
        .detection
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to serialize detection: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO incident_media (id, source_type, source_id, category, kind, storage_path,
                                    mime_type, byte_size, sha256, detection, false_alarm,
                                    captured_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(media.id.to_string())
    .bind(media.source.kind().as_str())
    .bind(media.source.id().to_string())
    .bind(media.category.as_str())
    .bind(media.kind.as_str())
    .bind(&media.storage_path)
    .bind(&media.mime_type)
    .bind(media.byte_size)
    .bind(&media.sha256)
    .bind(detection)
    .bind(media.false_alarm as i64)
    .bind(media.captured_at.as_ref().map(time::to_storage))
    .bind(time::to_storage(&media.created_at))
    .execute(executor)
    .await?;

    Ok(())
}

const MEDIA_COLUMNS: &str = r#"
    id, source_type, source_id, category, kind, storage_path, mime_type, byte_size,
    sha256, detection, false_alarm, captured_at, created_at
"#;

pub async fn get_media(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<IncidentMedia>> {
    let sql = format!("SELECT {} FROM incident_media WHERE id = ?", MEDIA_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(media_from_row).transpose()
}

/// All media attached to one source, oldest first
pub async fn list_for_source(
    executor: impl SqliteExecutor<'_>,
    source: MediaSource,
) -> Result<Vec<IncidentMedia>> {
    let sql = format!(
        "SELECT {} FROM incident_media WHERE source_type = ? AND source_id = ? ORDER BY rowid ASC",
        MEDIA_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(source.kind().as_str())
        .bind(source.id().to_string())
        .fetch_all(executor)
        .await?;

    rows.iter().map(media_from_row).collect()
}
