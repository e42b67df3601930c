//! Event types for the Bantay event system
//!
//! Provides the domain event enum and the EventBus shared by the workflow
//! (producer), the notification dispatcher and the SSE broadcast (consumers).

mod kind;
mod public;

pub use kind::EventKind;
pub use public::PublicEvent;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Actor, Concern, ConcernStatus, Distribution};

/// Bantay domain events
///
/// Emitted only after the unit of work that produced them has committed.
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BantayEvent {
    /// A concern was created (citizen submission or genuine detection)
    ///
    /// Triggers:
    /// - SSE: Show on operator dashboards
    ConcernSubmitted {
        concern: Concern,
        timestamp: DateTime<Utc>,
    },

    /// A concern received its handler
    ///
    /// Triggers:
    /// - SMS/Email: Notify the purok leader
    /// - SSE: Update dashboards
    ConcernAssigned {
        concern: Concern,
        distribution: Distribution,
        timestamp: DateTime<Utc>,
    },

    /// A transition was committed
    ///
    /// Snapshots are the rows as written by this transition.
    ///
    /// Triggers:
    /// - SMS/Email: Notify the submitting citizen
    /// - SSE: Update dashboards and the public tracker
    ConcernStatusUpdated {
        concern: Concern,
        distribution: Distribution,
        previous_status: ConcernStatus,
        new_status: ConcernStatus,
        actor: Actor,
        remarks: String,
        timestamp: DateTime<Utc>,
    },

    /// A detector snapshot was judged a false alarm and recorded only as media
    DetectionDismissed {
        media_id: Uuid,
        device_id: Uuid,
        confidence: f32,
        timestamp: DateTime<Utc>,
    },
}

impl BantayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BantayEvent::ConcernSubmitted { .. } => EventKind::ConcernSubmitted,
            BantayEvent::ConcernAssigned { .. } => EventKind::ConcernAssigned,
            BantayEvent::ConcernStatusUpdated { .. } => EventKind::ConcernStatusUpdated,
            BantayEvent::DetectionDismissed { .. } => EventKind::DetectionDismissed,
        }
    }

    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Concern this event concerns, if any
    pub fn concern_id(&self) -> Option<Uuid> {
        match self {
            BantayEvent::ConcernSubmitted { concern, .. }
            | BantayEvent::ConcernAssigned { concern, .. }
            | BantayEvent::ConcernStatusUpdated { concern, .. } => Some(concern.id),
            BantayEvent::DetectionDismissed { .. } => None,
        }
    }
}

/// Central event distribution bus
///
/// Thin wrapper over a tokio broadcast channel. Cloning shares the channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BantayEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers lag
    ///
    /// # Examples
    ///
    /// ```
    /// use bantay_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<BantayEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: BantayEvent,
    ) -> Result<usize, broadcast::error::SendError<BantayEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, logging instead of failing when nobody is listening
    ///
    /// Domain events are published after commit; a missing listener must never
    /// surface as an error to the request that caused the event.
    pub fn publish(&self, event: BantayEvent) {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = event_type, receivers, "Event published");
            }
            Err(_) => {
                tracing::warn!(event = event_type, "Event published with no subscribers");
            }
        }
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dismissed() -> BantayEvent {
        BantayEvent::DetectionDismissed {
            media_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            confidence: 0.12,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(8);
        assert!(bus.emit(dismissed()).is_err());
        // publish swallows the same condition
        bus.publish(dismissed());
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(dismissed());
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), EventKind::DetectionDismissed);
        assert_eq!(event.concern_id(), None);
    }

    #[test]
    fn test_serialized_event_is_tagged_with_type() {
        let json = serde_json::to_value(dismissed()).unwrap();
        assert_eq!(json["type"], "DetectionDismissed");
        assert!(json["media_id"].is_string());
    }

    #[test]
    fn test_event_type_matches_serde_tag() {
        let event = dismissed();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
    }
}
