//! Assigning a concern to its handler

use bantay_common::db::retry_on_contention;
use bantay_common::events::BantayEvent;
use bantay_common::models::{Actor, ActorRole, Concern, Distribution};
use bantay_common::{time, uuid_utils, Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use super::WorkflowContext;
use crate::db::{concerns, distributions, users};

/// Create the single distribution binding `concern_id` to `handler_id`.
///
/// Only operators assign. The handler must be a registered purok leader.
/// A concern that already has a distribution is rejected with `Conflict`.
pub async fn assign_concern(
    ctx: &WorkflowContext,
    concern_id: Uuid,
    handler_id: Uuid,
    assigner: Actor,
) -> Result<Distribution> {
    if !assigner.has_override() {
        return Err(Error::NotFoundOrUnauthorized(format!(
            "Concern {} not found",
            concern_id
        )));
    }

    let (concern, distribution) = retry_on_contention(
        "assign_concern",
        ctx.settings.db_max_lock_wait_ms,
        move || async move {
            let mut tx = ctx.db.begin().await?;

            let concern = concerns::get_concern(&mut *tx, concern_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFoundOrUnauthorized(format!("Concern {} not found", concern_id))
                })?;
            ensure_handler(&mut *tx, handler_id).await?;

            let distribution = distribute(&mut *tx, &concern, handler_id, time::now()).await?;
            tx.commit().await?;
            Ok((concern, distribution))
        },
    )
    .await?;

    info!(
        concern_id = %concern_id,
        handler_id = %handler_id,
        assigner_id = %assigner.id,
        "Concern assigned"
    );

    ctx.events.publish(BantayEvent::ConcernAssigned {
        concern,
        distribution: distribution.clone(),
        timestamp: distribution.assigned_at,
    });

    Ok(distribution)
}

/// Reject handlers that are unknown or not purok leaders
pub(crate) async fn ensure_handler(conn: &mut SqliteConnection, handler_id: Uuid) -> Result<()> {
    let handler = users::get_user(&mut *conn, handler_id)
        .await?
        .ok_or_else(|| Error::Validation(format!("Unknown handler {}", handler_id)))?;

    if handler.role != ActorRole::PurokLeader {
        return Err(Error::Validation(format!(
            "User {} is a {}, not a purok leader",
            handler_id, handler.role
        )));
    }
    Ok(())
}

/// Insert the distribution for `concern` inside the caller's transaction.
///
/// The distribution starts at the status mapped from the concern's current
/// status so the two tracks agree from the first write.
pub(crate) async fn distribute(
    conn: &mut SqliteConnection,
    concern: &Concern,
    handler_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Distribution> {
    if distributions::get_for_concern(&mut *conn, concern.id).await?.is_some() {
        return Err(Error::Conflict(format!(
            "Concern {} is already assigned",
            concern.id
        )));
    }

    let distribution = Distribution {
        id: uuid_utils::generate(),
        concern_id: concern.id,
        handler_id,
        status: concern.status.distribution_status(),
        assigned_at: now,
        acknowledged_at: None,
        updated_at: now,
    };

    distributions::insert_distribution(&mut *conn, &distribution)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                Error::Conflict(format!("Concern {} is already assigned", concern.id))
            } else {
                e
            }
        })?;

    Ok(distribution)
}
