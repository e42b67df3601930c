//! Transition engine
//!
//! Applies a requested status change to a concern and its distribution as
//! one atomic unit: the concern row (version-checked), the distribution row
//! (mapped status, first acknowledgement) and a new history entry commit
//! together or not at all. The `ConcernStatusUpdated` event is published
//! after the commit.

use bantay_common::db::retry_on_contention;
use bantay_common::events::BantayEvent;
use bantay_common::models::{
    Actor, Concern, ConcernStatus, Distribution, HistoryEntry, DEFAULT_REMARKS,
};
use bantay_common::{time, uuid_utils, Error, Result};
use tracing::{debug, info};
use uuid::Uuid;

use super::WorkflowContext;
use crate::db::{concerns, distributions, history};

/// Rows as written by one committed transition
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub concern: Concern,
    pub distribution: Distribution,
    pub history: HistoryEntry,
}

impl TransitionOutcome {
    pub fn previous_status(&self) -> ConcernStatus {
        self.history.previous_status
    }

    pub fn new_status(&self) -> ConcernStatus {
        self.history.status
    }
}

#[derive(Clone)]
pub struct TransitionEngine {
    ctx: WorkflowContext,
}

impl TransitionEngine {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    /// Move `concern_id` to `requested` on behalf of `actor`.
    ///
    /// The actor must be the distribution's handler or hold override
    /// rights; a missing concern, a concern without a distribution, a
    /// deleted concern and an unauthorized actor all fail with the same
    /// `NotFoundOrUnauthorized`. Blank remarks are recorded as
    /// `DEFAULT_REMARKS`.
    pub async fn apply_transition(
        &self,
        concern_id: Uuid,
        requested: ConcernStatus,
        actor: Actor,
        remarks: Option<&str>,
    ) -> Result<TransitionOutcome> {
        let remarks = normalize_remarks(remarks);

        let outcome = retry_on_contention(
            "apply_transition",
            self.ctx.settings.db_max_lock_wait_ms,
            || self.attempt(concern_id, requested, actor, &remarks),
        )
        .await?;

        info!(
            concern_id = %concern_id,
            actor_id = %actor.id,
            from = %outcome.previous_status(),
            to = %outcome.new_status(),
            "Concern transitioned"
        );

        self.ctx.events.publish(BantayEvent::ConcernStatusUpdated {
            concern: outcome.concern.clone(),
            distribution: outcome.distribution.clone(),
            previous_status: outcome.previous_status(),
            new_status: outcome.new_status(),
            actor,
            remarks: outcome.history.remarks.clone(),
            timestamp: outcome.history.created_at,
        });

        Ok(outcome)
    }

    /// One attempt of the unit of work. Dropping the transaction on any
    /// early return rolls it back.
    async fn attempt(
        &self,
        concern_id: Uuid,
        requested: ConcernStatus,
        actor: Actor,
        remarks: &str,
    ) -> Result<TransitionOutcome> {
        let mut tx = self.ctx.db.begin().await?;

        let distribution = distributions::get_for_concern(&mut *tx, concern_id)
            .await?
            .ok_or_else(|| not_found(concern_id))?;

        if !distribution.is_handled_by(actor.id) && !actor.has_override() {
            debug!(
                concern_id = %concern_id,
                actor_id = %actor.id,
                "Transition rejected: actor is not the handler"
            );
            return Err(not_found(concern_id));
        }

        let concern = concerns::get_concern(&mut *tx, concern_id)
            .await?
            .ok_or_else(|| not_found(concern_id))?;

        let now = time::now();
        let distribution_status = requested.distribution_status();
        let acknowledge = distribution.status.acknowledges(distribution_status);

        let updated =
            concerns::update_status_versioned(&mut *tx, concern.id, concern.version, requested, now)
                .await?;
        if !updated {
            return Err(Error::Stale(format!(
                "Concern {} changed since version {}",
                concern_id, concern.version
            )));
        }

        distributions::update_status(&mut *tx, distribution.id, distribution_status, acknowledge, now)
            .await?;

        let entry = HistoryEntry {
            id: uuid_utils::generate(),
            concern_id,
            actor_id: actor.id,
            previous_status: concern.status,
            status: requested,
            remarks: remarks.to_string(),
            created_at: now,
        };
        history::append_entry(&mut *tx, &entry).await?;

        let concern = concerns::get_concern(&mut *tx, concern_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Concern {} vanished mid-transition", concern_id)))?;
        let distribution = distributions::get_for_concern(&mut *tx, concern_id)
            .await?
            .ok_or_else(|| {
                Error::Internal(format!("Distribution for {} vanished mid-transition", concern_id))
            })?;

        tx.commit().await?;

        Ok(TransitionOutcome {
            concern,
            distribution,
            history: entry,
        })
    }
}

fn not_found(concern_id: Uuid) -> Error {
    Error::NotFoundOrUnauthorized(format!("Concern {} not found", concern_id))
}

fn normalize_remarks(remarks: Option<&str>) -> String {
    match remarks.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => DEFAULT_REMARKS.to_string(),
    }
}
