//! Citizen intake besides concerns: accident reports and media attachments

use bantay_common::db::retry_on_contention;
use bantay_common::models::{
    Accident, Actor, GeoPoint, IncidentMedia, MediaCategory, MediaSource, NewAccident,
};
use bantay_common::{time, uuid_utils, Error, Result};
use tracing::info;

use super::{load_visible_accident, WorkflowContext};
use crate::db::{accidents, concerns, devices, media};
use crate::ingest::media_store::{sniff_media, MediaStore};

/// Record an accident report, optionally linked to an existing concern
pub async fn report_accident(
    ctx: &WorkflowContext,
    reporter: Option<Actor>,
    new_accident: NewAccident,
) -> Result<Accident> {
    let description = new_accident.description.trim();
    if description.is_empty() {
        return Err(Error::Validation("Description must not be empty".to_string()));
    }
    let location = GeoPoint::from_parts(new_accident.latitude, new_accident.longitude)?;

    if let Some(concern_id) = new_accident.concern_id {
        if concerns::get_concern(&ctx.db, concern_id).await?.is_none() {
            return Err(Error::Validation(format!("Unknown concern {}", concern_id)));
        }
    }

    let accident = Accident {
        id: uuid_utils::generate(),
        concern_id: new_accident.concern_id,
        reported_by: reporter.map(|a| a.id),
        description: description.to_string(),
        location,
        occurred_at: new_accident.occurred_at,
        created_at: time::now(),
    };

    retry_on_contention("report_accident", ctx.settings.db_max_lock_wait_ms, || {
        accidents::insert_accident(&ctx.db, &accident)
    })
    .await?;

    info!(accident_id = %accident.id, "Accident reported");
    Ok(accident)
}

/// Store a citizen photo or voice recording against `source`.
///
/// The source must resolve and be writable by `actor`: the concern's
/// submitter, the accident's reporter, or an operator (devices accept
/// operator uploads only).
pub async fn attach_media(
    ctx: &WorkflowContext,
    store: &MediaStore,
    source: MediaSource,
    bytes: &[u8],
    actor: Actor,
) -> Result<IncidentMedia> {
    authorize_source(ctx, source, actor).await?;

    if bytes.is_empty() {
        return Err(Error::Validation("Uploaded file is empty".to_string()));
    }
    if bytes.len() > ctx.settings.ingest_max_image_bytes {
        return Err(Error::Validation(format!(
            "Uploaded file exceeds {} bytes",
            ctx.settings.ingest_max_image_bytes
        )));
    }
    let sniffed = sniff_media(bytes)?;

    let stored = store
        .store(MediaCategory::CitizenConcern, bytes, sniffed.extension)
        .await?;

    let record = IncidentMedia {
        id: uuid_utils::generate(),
        source,
        category: MediaCategory::CitizenConcern,
        kind: sniffed.kind,
        storage_path: stored.relative_path,
        mime_type: sniffed.mime_type.to_string(),
        byte_size: stored.byte_size,
        sha256: stored.sha256,
        detection: None,
        false_alarm: false,
        captured_at: None,
        created_at: time::now(),
    };

    retry_on_contention("attach_media", ctx.settings.db_max_lock_wait_ms, || {
        media::insert_media(&ctx.db, &record)
    })
    .await?;

    info!(
        media_id = %record.id,
        source_type = %source.kind(),
        source_id = %source.id(),
        kind = %record.kind,
        "Media attached"
    );
    Ok(record)
}

async fn authorize_source(ctx: &WorkflowContext, source: MediaSource, actor: Actor) -> Result<()> {
    match source {
        MediaSource::Concern(id) => {
            let concern = concerns::get_concern(&ctx.db, id).await?;
            match concern {
                Some(c) if actor.has_override() || c.submitted_by == Some(actor.id) => Ok(()),
                _ => Err(Error::NotFoundOrUnauthorized(format!("Concern {} not found", id))),
            }
        }
        MediaSource::Accident(id) => load_visible_accident(&ctx.db, id, actor).await.map(|_| ()),
        MediaSource::Device(id) => match devices::get_device(&ctx.db, id).await? {
            Some(_) if actor.has_override() => Ok(()),
            _ => Err(Error::NotFoundOrUnauthorized(format!("Device {} not found", id))),
        },
    }
}
