//! Notification dispatch tests with in-memory gateways

mod helpers;

use async_trait::async_trait;
use bantay_common::events::{BantayEvent, EventKind};
use bantay_common::models::ConcernStatus;
use bantay_common::{Error, Result};
use bantay_ir::notify::templates::EmailMessage;
use bantay_ir::notify::{register_notifiers, Dispatcher, EmailSender, RetryPolicy, SmsGateway};
use bantay_ir::workflow::{self, TransitionEngine};
use helpers::TestEnv;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    /// Number of leading calls that fail
    fail_first: u32,
    calls: AtomicU32,
}

#[async_trait]
impl SmsGateway for RecordingSms {
    async fn send_sms(&self, to: &str, message: &str) -> Result<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_first {
            return Err(Error::Upstream("gateway timeout".to_string()));
        }
        self.sent.lock().unwrap().push((to.to_string(), message.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingEmail {
    sent: Mutex<Vec<(String, EmailMessage)>>,
    always_fail: bool,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send_email(&self, to: &str, message: &EmailMessage) -> Result<()> {
        if self.always_fail {
            return Err(Error::Upstream("mail API down".to_string()));
        }
        self.sent.lock().unwrap().push((to.to_string(), message.clone()));
        Ok(())
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_millis(1),
    }
}

fn dispatcher(env: &TestEnv, sms: Arc<RecordingSms>, email: Arc<RecordingEmail>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new(fast_policy());
    register_notifiers(&mut dispatcher, env.db.clone(), sms, email);
    dispatcher
}

async fn run(dispatcher: &Dispatcher, event: BantayEvent) {
    for handle in dispatcher.dispatch(event) {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_subscription_table() {
    let env = TestEnv::new().await;
    let dispatcher = dispatcher(&env, Arc::default(), Arc::default());

    assert_eq!(dispatcher.subscription_count(), 4);
    assert_eq!(
        dispatcher.handler_names(EventKind::ConcernStatusUpdated),
        vec!["sms", "email"]
    );
    assert!(dispatcher.handler_names(EventKind::ConcernSubmitted).is_empty());
    assert!(dispatcher.handler_names(EventKind::DetectionDismissed).is_empty());
}

#[tokio::test]
async fn test_status_update_notifies_submitter() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.assigned_concern(&citizen, &leader, &operator).await;

    let sms = Arc::new(RecordingSms::default());
    let email = Arc::new(RecordingEmail::default());
    let dispatcher = dispatcher(&env, sms.clone(), email.clone());

    let mut rx = env.events.subscribe();
    TransitionEngine::new(env.ctx())
        .apply_transition(concern.id, ConcernStatus::Resolved, leader.as_actor(), Some("Fixed"))
        .await
        .unwrap();
    run(&dispatcher, rx.recv().await.unwrap()).await;

    let sent = sms.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(Some(sent[0].0.clone()), citizen.phone);
    assert!(sent[0].1.contains(&concern.tracking_code));
    assert!(sent[0].1.contains("Resolved"));
    assert!(sent[0].1.contains("Fixed"));

    let mails = email.sent.lock().unwrap().clone();
    assert_eq!(mails.len(), 1);
    assert_eq!(Some(mails[0].0.clone()), citizen.email);
    assert!(mails[0].1.subject.contains(&concern.tracking_code));
}

#[tokio::test]
async fn test_assignment_notifies_handler() {
    let env = TestEnv::new().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.submit(None).await;

    let sms = Arc::new(RecordingSms::default());
    let dispatcher = dispatcher(&env, sms.clone(), Arc::default());

    let mut rx = env.events.subscribe();
    workflow::assign_concern(&env.ctx(), concern.id, leader.id, operator.as_actor())
        .await
        .unwrap();
    run(&dispatcher, rx.recv().await.unwrap()).await;

    let sent = sms.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(Some(sent[0].0.clone()), leader.phone);
    assert!(sent[0].1.contains("assigned to you"));
}

#[tokio::test]
async fn test_anonymous_concern_has_no_status_recipient() {
    let env = TestEnv::new().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.submit(None).await;
    workflow::assign_concern(&env.ctx(), concern.id, leader.id, operator.as_actor())
        .await
        .unwrap();

    let sms = Arc::new(RecordingSms::default());
    let dispatcher = dispatcher(&env, sms.clone(), Arc::default());

    let mut rx = env.events.subscribe();
    TransitionEngine::new(env.ctx())
        .apply_transition(concern.id, ConcernStatus::Ongoing, leader.as_actor(), None)
        .await
        .unwrap();
    run(&dispatcher, rx.recv().await.unwrap()).await;

    assert!(sms.sent.lock().unwrap().is_empty());
    assert_eq!(sms.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transient_gateway_failure_is_retried() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.assigned_concern(&citizen, &leader, &operator).await;

    let sms = Arc::new(RecordingSms {
        fail_first: 2,
        ..Default::default()
    });
    let dispatcher = dispatcher(&env, sms.clone(), Arc::default());

    let mut rx = env.events.subscribe();
    TransitionEngine::new(env.ctx())
        .apply_transition(concern.id, ConcernStatus::Ongoing, leader.as_actor(), None)
        .await
        .unwrap();
    run(&dispatcher, rx.recv().await.unwrap()).await;

    assert_eq!(sms.calls.load(Ordering::SeqCst), 3);
    assert_eq!(sms.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failing_channel_does_not_block_others_or_workflow() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.assigned_concern(&citizen, &leader, &operator).await;

    let sms = Arc::new(RecordingSms::default());
    let email = Arc::new(RecordingEmail {
        always_fail: true,
        ..Default::default()
    });
    let handle = dispatcher(&env, sms.clone(), email).spawn(&env.events);

    let outcome = TransitionEngine::new(env.ctx())
        .apply_transition(concern.id, ConcernStatus::Ongoing, leader.as_actor(), None)
        .await;
    assert!(outcome.is_ok());

    // Delivery is asynchronous; wait for the SMS task
    for _ in 0..100 {
        if !sms.sent.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(sms.sent.lock().unwrap().len(), 1);

    handle.abort();
}
