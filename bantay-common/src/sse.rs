//! Server-Sent Events (SSE) utilities
//!
//! Turns an EventBus subscription into an SSE response: one SSE event per
//! domain event (`event: <EventType>`, JSON data) plus a heartbeat comment.
//! Frames carry the [`PublicEvent`] projection, never the full snapshots.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::events::{BantayEvent, PublicEvent};

/// Heartbeat interval for idle connections
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Convert a domain event into an SSE frame
pub fn to_sse_event(event: &BantayEvent) -> Option<Event> {
    match serde_json::to_string(&PublicEvent::from(event)) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
            None
        }
    }
}

/// Create an SSE stream forwarding every event received on `rx`
///
/// Lagging clients skip the events they missed and keep streaming. The
/// stream ends when the bus is dropped.
pub fn create_event_sse_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<BantayEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(frame) = to_sse_event(&event) {
                        debug!("SSE: Broadcasting {}", event.event_type());
                        yield Ok(frame);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat"))
}
