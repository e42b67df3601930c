//! Append-only audit trail of status transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ConcernStatus;

/// Remark recorded when the actor supplies none
pub const DEFAULT_REMARKS: &str = "Status updated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub concern_id: Uuid,
    pub actor_id: Uuid,
    pub previous_status: ConcernStatus,
    pub status: ConcernStatus,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}
