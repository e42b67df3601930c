//! Assignment of a concern to its responsible handler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DistributionStatus;

/// Binds one concern to one purok leader.
///
/// `status` only changes together with the concern's status, inside the
/// transition unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: Uuid,
    pub concern_id: Uuid,
    pub handler_id: Uuid,
    pub status: DistributionStatus,
    pub assigned_at: DateTime<Utc>,
    /// Set once, on the first transition out of `assigned`
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Distribution {
    pub fn is_handled_by(&self, actor_id: Uuid) -> bool {
        self.handler_id == actor_id
    }
}
