//! Shared fixtures for bantay-ir integration tests
//!
//! Every test gets its own temporary root folder with a fresh database and
//! media store, so tests can run in parallel.

#![allow(dead_code)]

use bantay_common::db::{init_database, RuntimeSettings};
use bantay_common::events::EventBus;
use bantay_common::models::{
    Actor, ActorRole, Category, Concern, Device, GeoPoint, NewConcern, NewUser, OriginType, User,
};
use bantay_common::uuid_utils;
use bantay_ir::db::{devices, users};
use bantay_ir::ingest::MediaStore;
use bantay_ir::workflow::{self, WorkflowContext};
use bantay_ir::AppState;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

/// Smallest byte sequence `infer` recognizes as a PNG
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
];

pub const EMERGENCY_LABELS: &[&str] = &["fire", "smoke", "flood", "weapon"];

pub struct TestEnv {
    /// Held so the folder outlives the test
    pub dir: TempDir,
    pub db: SqlitePool,
    pub events: EventBus,
    pub settings: RuntimeSettings,
    pub media_store: MediaStore,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = init_database(&dir.path().join("bantay.db")).await.unwrap();
        let settings = RuntimeSettings::load(&db).await.unwrap();
        let media_store = MediaStore::new(dir.path().join("media"));

        Self {
            dir,
            db,
            events: EventBus::new(64),
            settings,
            media_store,
        }
    }

    pub fn ctx(&self) -> WorkflowContext {
        WorkflowContext::new(self.db.clone(), self.events.clone(), self.settings.clone())
    }

    /// Service state with request signing disabled and threshold-only classification
    pub fn state(&self) -> AppState {
        self.state_with_secret(0)
    }

    pub fn state_with_secret(&self, shared_secret: i64) -> AppState {
        AppState::new(
            self.db.clone(),
            self.events.clone(),
            self.settings.clone(),
            shared_secret,
            self.media_store.clone(),
            None,
            EMERGENCY_LABELS.iter().map(|l| l.to_string()).collect(),
        )
    }

    pub async fn user(&self, name: &str, role: ActorRole) -> User {
        users::insert_user(
            &self.db,
            &NewUser {
                name: name.to_string(),
                role,
                phone: Some("+639171234567".to_string()),
                email: Some(format!("{}@example.ph", name.to_lowercase())),
                purok: Some("Purok 3".to_string()),
            },
        )
        .await
        .unwrap()
    }

    pub async fn citizen(&self) -> User {
        self.user("Citizen", ActorRole::Citizen).await
    }

    pub async fn leader(&self) -> User {
        self.user("Leader", ActorRole::PurokLeader).await
    }

    pub async fn operator(&self) -> User {
        self.user("Operator", ActorRole::Operator).await
    }

    pub async fn device(&self, default_handler_id: Option<Uuid>, enabled: bool) -> Device {
        let device = Device {
            id: uuid_utils::generate(),
            name: "Gate camera".to_string(),
            location_label: Some("Barangay hall gate".to_string()),
            location: Some(GeoPoint::new(10.3157, 123.8854).unwrap()),
            enabled,
            default_handler_id,
            created_at: bantay_common::time::now(),
        };
        devices::insert_device(&self.db, &device).await.unwrap();
        device
    }

    /// Submitted by `submitter`, then assigned to `handler` by `operator`
    pub async fn assigned_concern(&self, submitter: &User, handler: &User, operator: &User) -> Concern {
        let concern = self.submit(Some(submitter.as_actor())).await;
        workflow::assign_concern(&self.ctx(), concern.id, handler.id, operator.as_actor())
            .await
            .unwrap();
        concern
    }

    pub async fn submit(&self, submitter: Option<Actor>) -> Concern {
        workflow::submit_concern(&self.ctx(), submitter, new_concern()).await.unwrap()
    }
}

pub fn new_concern() -> NewConcern {
    NewConcern {
        origin: OriginType::Manual,
        category: Category::Infrastructure,
        severity: None,
        latitude: Some(10.3157),
        longitude: Some(123.8854),
        title: "Broken streetlight on Rizal St.".to_string(),
        description: Some("Dark since Monday".to_string()),
    }
}
