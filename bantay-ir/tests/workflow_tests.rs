//! Submission, assignment, registration and intake tests

mod helpers;

use bantay_common::events::BantayEvent;
use bantay_common::models::{
    ActorRole, ConcernStatus, DistributionStatus, MediaCategory, MediaSource, NewAccident, NewDevice,
    NewUser,
};
use bantay_common::Error;
use bantay_ir::db::concerns;
use bantay_ir::workflow::{self, tracking::is_well_formed, TransitionEngine};
use helpers::{new_concern, TestEnv, PNG_BYTES};

#[tokio::test]
async fn test_submit_creates_pending_concern_with_tracking_code() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let mut rx = env.events.subscribe();

    let concern = env.submit(Some(citizen.as_actor())).await;
    assert_eq!(concern.status, ConcernStatus::Pending);
    assert_eq!(concern.version, 0);
    assert_eq!(concern.submitted_by, Some(citizen.id));
    assert!(is_well_formed(&concern.tracking_code));

    let by_code = concerns::get_by_tracking_code(&env.db, &concern.tracking_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_code.id, concern.id);

    assert!(matches!(
        rx.recv().await.unwrap(),
        BantayEvent::ConcernSubmitted { .. }
    ));
}

#[tokio::test]
async fn test_submit_rejects_blank_title() {
    let env = TestEnv::new().await;
    let mut payload = new_concern();
    payload.title = "  ".to_string();

    let result = workflow::submit_concern(&env.ctx(), None, payload).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_assign_requires_operator_and_leader() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.submit(Some(citizen.as_actor())).await;

    let by_leader = workflow::assign_concern(&env.ctx(), concern.id, leader.id, leader.as_actor()).await;
    assert!(matches!(by_leader, Err(Error::NotFoundOrUnauthorized(_))));

    let to_citizen =
        workflow::assign_concern(&env.ctx(), concern.id, citizen.id, operator.as_actor()).await;
    assert!(matches!(to_citizen, Err(Error::Validation(_))));

    let distribution =
        workflow::assign_concern(&env.ctx(), concern.id, leader.id, operator.as_actor())
            .await
            .unwrap();
    assert_eq!(distribution.status, DistributionStatus::Assigned);
    assert_eq!(distribution.handler_id, leader.id);

    let again = workflow::assign_concern(&env.ctx(), concern.id, leader.id, operator.as_actor()).await;
    assert!(matches!(again, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_assign_after_transition_maps_current_status() {
    let env = TestEnv::new().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.submit(None).await;

    // Only distributed concerns transition, so mark the row directly
    concerns::update_status_versioned(
        &env.db,
        concern.id,
        0,
        ConcernStatus::Escalated,
        bantay_common::time::now(),
    )
    .await
    .unwrap();

    let distribution =
        workflow::assign_concern(&env.ctx(), concern.id, leader.id, operator.as_actor())
            .await
            .unwrap();
    assert_eq!(distribution.status, DistributionStatus::Escalated);
}

#[tokio::test]
async fn test_visibility_rules() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let stranger = env.user("Stranger", ActorRole::Citizen).await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.assigned_concern(&citizen, &leader, &operator).await;

    for actor in [citizen.as_actor(), leader.as_actor(), operator.as_actor()] {
        assert!(workflow::load_visible_concern(&env.db, concern.id, actor).await.is_ok());
    }
    let hidden = workflow::load_visible_concern(&env.db, concern.id, stranger.as_actor()).await;
    assert!(matches!(hidden, Err(Error::NotFoundOrUnauthorized(_))));
}

#[tokio::test]
async fn test_soft_delete_hides_but_keeps_history() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let stranger = env.user("Stranger", ActorRole::Citizen).await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let concern = env.assigned_concern(&citizen, &leader, &operator).await;
    TransitionEngine::new(env.ctx())
        .apply_transition(concern.id, ConcernStatus::Ongoing, leader.as_actor(), None)
        .await
        .unwrap();

    let denied = workflow::soft_delete_concern(&env.ctx(), concern.id, stranger.as_actor()).await;
    assert!(matches!(denied, Err(Error::NotFoundOrUnauthorized(_))));

    workflow::soft_delete_concern(&env.ctx(), concern.id, citizen.as_actor())
        .await
        .unwrap();

    assert!(concerns::get_concern(&env.db, concern.id).await.unwrap().is_none());
    assert!(concerns::get_by_tracking_code(&env.db, &concern.tracking_code)
        .await
        .unwrap()
        .is_none());
    let kept = concerns::get_concern_including_deleted(&env.db, concern.id)
        .await
        .unwrap()
        .unwrap();
    assert!(kept.is_deleted());
    assert_eq!(
        bantay_ir::db::history::list_for_concern(&env.db, concern.id)
            .await
            .unwrap()
            .len(),
        1
    );

    let twice = workflow::soft_delete_concern(&env.ctx(), concern.id, citizen.as_actor()).await;
    assert!(matches!(twice, Err(Error::NotFoundOrUnauthorized(_))));
}

#[tokio::test]
async fn test_register_user_roles() {
    let env = TestEnv::new().await;
    let ctx = env.ctx();
    let new_user = |name: &str, role| NewUser {
        name: name.to_string(),
        role,
        phone: None,
        email: None,
        purok: None,
    };

    let citizen = workflow::register_user(&ctx, None, new_user("Ana", ActorRole::Citizen))
        .await
        .unwrap();
    assert_eq!(citizen.role, ActorRole::Citizen);

    // Leaders need an operator
    let leader = workflow::register_user(
        &ctx,
        Some(citizen.as_actor()),
        new_user("Ben", ActorRole::PurokLeader),
    )
    .await;
    assert!(matches!(leader, Err(Error::Validation(_))));

    // The first operator bootstraps itself, the second does not
    let first = workflow::register_user(&ctx, None, new_user("Ops", ActorRole::Operator))
        .await
        .unwrap();
    let second = workflow::register_user(&ctx, None, new_user("Ops2", ActorRole::Operator)).await;
    assert!(matches!(second, Err(Error::Validation(_))));

    let leader = workflow::register_user(
        &ctx,
        Some(first.as_actor()),
        new_user("Ben", ActorRole::PurokLeader),
    )
    .await
    .unwrap();
    assert_eq!(leader.role, ActorRole::PurokLeader);
}

#[tokio::test]
async fn test_register_and_disable_device() {
    let env = TestEnv::new().await;
    let leader = env.leader().await;
    let operator = env.operator().await;
    let ctx = env.ctx();

    let payload = NewDevice {
        name: " North gate ".to_string(),
        location_label: Some("North gate".to_string()),
        latitude: Some(10.0),
        longitude: Some(123.0),
        default_handler_id: Some(leader.id),
    };

    let denied = workflow::register_device(&ctx, leader.as_actor(), payload.clone()).await;
    assert!(matches!(denied, Err(Error::NotFoundOrUnauthorized(_))));

    let device = workflow::register_device(&ctx, operator.as_actor(), payload)
        .await
        .unwrap();
    assert_eq!(device.name, "North gate");
    assert!(device.enabled);

    let disabled = workflow::set_device_enabled(&ctx, operator.as_actor(), device.id, false)
        .await
        .unwrap();
    assert!(!disabled.enabled);
}

#[tokio::test]
async fn test_accident_report_and_media() {
    let env = TestEnv::new().await;
    let citizen = env.citizen().await;
    let stranger = env.user("Stranger", ActorRole::Citizen).await;
    let ctx = env.ctx();

    let accident = workflow::report_accident(
        &ctx,
        Some(citizen.as_actor()),
        NewAccident {
            concern_id: None,
            description: "Motorcycle collision".to_string(),
            latitude: None,
            longitude: None,
            occurred_at: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(accident.reported_by, Some(citizen.id));

    let media = workflow::attach_media(
        &ctx,
        &env.media_store,
        MediaSource::Accident(accident.id),
        PNG_BYTES,
        citizen.as_actor(),
    )
    .await
    .unwrap();
    assert_eq!(media.category, MediaCategory::CitizenConcern);
    assert_eq!(media.mime_type, "image/png");
    assert!(env.media_store.resolve(&media.storage_path).exists());

    let denied = workflow::attach_media(
        &ctx,
        &env.media_store,
        MediaSource::Accident(accident.id),
        PNG_BYTES,
        stranger.as_actor(),
    )
    .await;
    assert!(matches!(denied, Err(Error::NotFoundOrUnauthorized(_))));

    let not_media = workflow::attach_media(
        &ctx,
        &env.media_store,
        MediaSource::Accident(accident.id),
        b"plain text, not an image",
        citizen.as_actor(),
    )
    .await;
    assert!(matches!(not_media, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_accident_must_link_existing_concern() {
    let env = TestEnv::new().await;
    let result = workflow::report_accident(
        &env.ctx(),
        None,
        NewAccident {
            concern_id: Some(uuid::Uuid::new_v4()),
            description: "Fallen tree".to_string(),
            latitude: None,
            longitude: None,
            occurred_at: None,
        },
    )
    .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}
