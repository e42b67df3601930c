//! Read access to concerns and accidents
//!
//! Invisible and missing records fail identically so callers cannot probe
//! for ids they have no business with.

use bantay_common::models::{Accident, Actor, Concern};
use bantay_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{accidents, concerns, distributions};

/// Concern readable by its submitter, its handler and operators
pub async fn load_visible_concern(db: &SqlitePool, concern_id: Uuid, actor: Actor) -> Result<Concern> {
    let not_found = || Error::NotFoundOrUnauthorized(format!("Concern {} not found", concern_id));

    let concern = concerns::get_concern(db, concern_id)
        .await?
        .ok_or_else(not_found)?;

    if actor.has_override() || concern.submitted_by == Some(actor.id) {
        return Ok(concern);
    }

    match distributions::get_for_concern(db, concern_id).await? {
        Some(d) if d.is_handled_by(actor.id) => Ok(concern),
        _ => Err(not_found()),
    }
}

/// Accident readable by its reporter and operators
pub async fn load_visible_accident(
    db: &SqlitePool,
    accident_id: Uuid,
    actor: Actor,
) -> Result<Accident> {
    let not_found = || Error::NotFoundOrUnauthorized(format!("Accident {} not found", accident_id));

    let accident = accidents::get_accident(db, accident_id)
        .await?
        .ok_or_else(not_found)?;

    if actor.has_override() || accident.reported_by == Some(actor.id) {
        Ok(accident)
    } else {
        Err(not_found())
    }
}
