//! Public projection of domain events
//!
//! The SSE broadcast is unauthenticated, so it carries only what the public
//! tracker already shows: tracking code, status, category and timestamps.
//! Ids, locations, descriptions, actors and remarks never leave the service
//! through this type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BantayEvent, EventKind};
use crate::models::{Category, Concern, ConcernStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PublicEvent {
    ConcernSubmitted {
        tracking_code: String,
        status: ConcernStatus,
        category: Category,
        timestamp: DateTime<Utc>,
    },
    ConcernAssigned {
        tracking_code: String,
        status: ConcernStatus,
        category: Category,
        timestamp: DateTime<Utc>,
    },
    ConcernStatusUpdated {
        tracking_code: String,
        previous_status: ConcernStatus,
        new_status: ConcernStatus,
        category: Category,
        timestamp: DateTime<Utc>,
    },
    DetectionDismissed {
        timestamp: DateTime<Utc>,
    },
}

impl PublicEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PublicEvent::ConcernSubmitted { .. } => EventKind::ConcernSubmitted,
            PublicEvent::ConcernAssigned { .. } => EventKind::ConcernAssigned,
            PublicEvent::ConcernStatusUpdated { .. } => EventKind::ConcernStatusUpdated,
            PublicEvent::DetectionDismissed { .. } => EventKind::DetectionDismissed,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

fn tracked(concern: &Concern) -> (String, ConcernStatus, Category) {
    (concern.tracking_code.clone(), concern.status, concern.category)
}

impl From<&BantayEvent> for PublicEvent {
    fn from(event: &BantayEvent) -> Self {
        match event {
            BantayEvent::ConcernSubmitted { concern, timestamp } => {
                let (tracking_code, status, category) = tracked(concern);
                PublicEvent::ConcernSubmitted {
                    tracking_code,
                    status,
                    category,
                    timestamp: *timestamp,
                }
            }
            BantayEvent::ConcernAssigned {
                concern, timestamp, ..
            } => {
                let (tracking_code, status, category) = tracked(concern);
                PublicEvent::ConcernAssigned {
                    tracking_code,
                    status,
                    category,
                    timestamp: *timestamp,
                }
            }
            BantayEvent::ConcernStatusUpdated {
                concern,
                previous_status,
                new_status,
                timestamp,
                ..
            } => PublicEvent::ConcernStatusUpdated {
                tracking_code: concern.tracking_code.clone(),
                previous_status: *previous_status,
                new_status: *new_status,
                category: concern.category,
                timestamp: *timestamp,
            },
            BantayEvent::DetectionDismissed { timestamp, .. } => PublicEvent::DetectionDismissed {
                timestamp: *timestamp,
            },
        }
    }
}
