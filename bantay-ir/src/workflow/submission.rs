//! Concern submission and soft deletion

use bantay_common::db::retry_on_contention;
use bantay_common::events::BantayEvent;
use bantay_common::models::{Actor, Concern, ConcernStatus, NewConcern};
use bantay_common::{time, uuid_utils, Error, Result};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use super::tracking::generate_tracking_code;
use super::WorkflowContext;
use crate::db::concerns;

/// Record a new concern in `pending` and announce it.
///
/// `submitter` is None for anonymous reports.
pub async fn submit_concern(
    ctx: &WorkflowContext,
    submitter: Option<Actor>,
    new_concern: NewConcern,
) -> Result<Concern> {
    let location = new_concern.validate()?;
    let now = time::now();

    let template = Concern {
        id: uuid_utils::generate(),
        tracking_code: String::new(),
        origin: new_concern.origin,
        category: new_concern.category,
        severity: new_concern.severity,
        status: ConcernStatus::Pending,
        location,
        title: new_concern.title.trim().to_string(),
        description: new_concern
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        submitted_by: submitter.map(|a| a.id),
        version: 0,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let max_attempts = ctx.settings.tracking_code_max_attempts;
    let concern = retry_on_contention("submit_concern", ctx.settings.db_max_lock_wait_ms, || {
        let template = template.clone();
        async move {
            let mut conn = ctx.db.acquire().await?;
            insert_with_tracking_code(&mut *conn, template, max_attempts).await
        }
    })
    .await?;

    info!(
        concern_id = %concern.id,
        tracking_code = %concern.tracking_code,
        origin = %concern.origin,
        category = %concern.category,
        "Concern submitted"
    );

    ctx.events.publish(BantayEvent::ConcernSubmitted {
        concern: concern.clone(),
        timestamp: concern.created_at,
    });

    Ok(concern)
}

/// Insert `concern` under a freshly generated tracking code, regenerating
/// on collision up to `max_attempts` times.
pub(crate) async fn insert_with_tracking_code(
    conn: &mut SqliteConnection,
    mut concern: Concern,
    max_attempts: u32,
) -> Result<Concern> {
    for attempt in 1..=max_attempts {
        concern.tracking_code = generate_tracking_code(concern.created_at, &mut rand::thread_rng());

        match concerns::insert_concern(&mut *conn, &concern).await {
            Ok(()) => return Ok(concern),
            Err(e) if e.is_unique_violation() => {
                warn!(
                    tracking_code = %concern.tracking_code,
                    attempt,
                    "Tracking code collision, regenerating"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::Internal(format!(
        "No unique tracking code after {} attempts",
        max_attempts
    )))
}

/// Hide a concern from every lookup and transition.
///
/// Allowed for the submitting citizen and operators. History and media stay.
pub async fn soft_delete_concern(ctx: &WorkflowContext, concern_id: Uuid, actor: Actor) -> Result<()> {
    let not_found = || Error::NotFoundOrUnauthorized(format!("Concern {} not found", concern_id));

    let concern = concerns::get_concern(&ctx.db, concern_id)
        .await?
        .ok_or_else(not_found)?;

    if !actor.has_override() && concern.submitted_by != Some(actor.id) {
        return Err(not_found());
    }

    let deleted = retry_on_contention(
        "soft_delete_concern",
        ctx.settings.db_max_lock_wait_ms,
        || concerns::soft_delete(&ctx.db, concern_id, time::now()),
    )
    .await?;

    if !deleted {
        return Err(not_found());
    }

    info!(concern_id = %concern_id, actor_id = %actor.id, "Concern soft-deleted");
    Ok(())
}
