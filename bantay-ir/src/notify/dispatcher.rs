//! Event dispatcher
//!
//! Holds an explicit `(EventKind, handler)` subscription table, listens on
//! the `EventBus` and runs every matching handler for an event in its own
//! task with bounded retry. A failing handler never affects the workflow
//! operation that produced the event, nor the other handlers.

use async_trait::async_trait;
use bantay_common::db::RuntimeSettings;
use bantay_common::events::{BantayEvent, EventBus, EventKind};
use bantay_common::{time, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Side effect triggered by a domain event
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &BantayEvent) -> Result<()>;
}

/// Bounded retry with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        Self {
            max_attempts: settings.notify_max_attempts.max(1),
            backoff: time::millis_to_duration(settings.notify_retry_backoff_ms),
        }
    }
}

/// Run `handler` until it succeeds or `policy.max_attempts` is spent.
///
/// Returns the number of attempts used on success, the last error otherwise.
pub async fn deliver_with_retry(
    handler: &dyn EventHandler,
    event: &BantayEvent,
    policy: RetryPolicy,
) -> Result<u32> {
    let mut attempt = 1;
    loop {
        match handler.handle(event).await {
            Ok(()) => return Ok(attempt),
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    handler = handler.name(),
                    event = event.event_type(),
                    attempt,
                    max_attempts = policy.max_attempts,
                    "Handler failed, retrying: {}",
                    e
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

struct Subscription {
    kind: EventKind,
    handler: Arc<dyn EventHandler>,
}

pub struct Dispatcher {
    subscriptions: Vec<Subscription>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            subscriptions: Vec::new(),
            policy,
        }
    }

    /// Run `handler` for every event of `kind`
    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> &mut Self {
        debug!(event = %kind, handler = handler.name(), "Handler registered");
        self.subscriptions.push(Subscription { kind, handler });
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Names of the handlers registered for `kind`, in registration order
    pub fn handler_names(&self, kind: EventKind) -> Vec<&'static str> {
        self.subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.handler.name())
            .collect()
    }

    /// Start one task per matching handler; returns their handles
    pub fn dispatch(&self, event: BantayEvent) -> Vec<JoinHandle<()>> {
        let event = Arc::new(event);
        let kind = event.kind();
        let policy = self.policy;

        self.subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| {
                let handler = Arc::clone(&s.handler);
                let event = Arc::clone(&event);
                tokio::spawn(async move {
                    match deliver_with_retry(handler.as_ref(), &event, policy).await {
                        Ok(attempts) => debug!(
                            handler = handler.name(),
                            event = event.event_type(),
                            attempts,
                            "Handler completed"
                        ),
                        Err(e) => error!(
                            handler = handler.name(),
                            event = event.event_type(),
                            concern_id = ?event.concern_id(),
                            attempts = policy.max_attempts,
                            "Handler gave up: {}",
                            e
                        ),
                    }
                })
            })
            .collect()
    }

    /// Subscribe to `bus` and dispatch until the bus closes.
    ///
    /// The subscription is taken before this returns, so events published
    /// after the call are never missed.
    pub fn spawn(self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        info!(
            subscriptions = self.subscriptions.len(),
            "Notification dispatcher started"
        );

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        self.dispatch(event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dispatcher lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => {
                        info!("Event bus closed, dispatcher stopping");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bantay_common::Error;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct Flaky {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl EventHandler for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn handle(&self, _event: &BantayEvent) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                Err(Error::Upstream(format!("attempt {} failed", n)))
            } else {
                Ok(())
            }
        }
    }

    fn dismissed() -> BantayEvent {
        BantayEvent::DetectionDismissed {
            media_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            confidence: 0.2,
            timestamp: time::now(),
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let handler = Flaky {
            calls: AtomicU32::new(0),
            fail_first: 2,
        };
        let attempts = deliver_with_retry(&handler, &dismissed(), fast_policy(3))
            .await
            .unwrap();
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let handler = Flaky {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        };
        let result = deliver_with_retry(&handler, &dismissed(), fast_policy(3)).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dispatch_runs_only_matching_handlers() {
        let matching = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });
        let other = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });

        let mut dispatcher = Dispatcher::new(fast_policy(1));
        dispatcher
            .register(EventKind::DetectionDismissed, matching.clone())
            .register(EventKind::ConcernSubmitted, other.clone());

        for handle in dispatcher.dispatch(dismissed()) {
            handle.await.unwrap();
        }

        assert_eq!(matching.calls.load(Ordering::SeqCst), 1);
        assert_eq!(other.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.handler_names(EventKind::DetectionDismissed), vec!["flaky"]);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let failing = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        });
        let healthy = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });

        let mut dispatcher = Dispatcher::new(fast_policy(2));
        dispatcher
            .register(EventKind::DetectionDismissed, failing.clone())
            .register(EventKind::DetectionDismissed, healthy.clone());

        for handle in dispatcher.dispatch(dismissed()) {
            handle.await.unwrap();
        }

        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawned_dispatcher_receives_bus_events() {
        let handler = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });
        let bus = EventBus::new(16);

        let mut dispatcher = Dispatcher::new(fast_policy(1));
        dispatcher.register(EventKind::DetectionDismissed, handler.clone());
        let _task = dispatcher.spawn(&bus);

        bus.publish(dismissed());

        for _ in 0..100 {
            if handler.calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }
}
