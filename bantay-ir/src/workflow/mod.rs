//! Concern workflow
//!
//! Every operation that changes workflow state runs as one unit of work
//! (a single SQLite transaction, retried on contention) and publishes its
//! domain events only after the commit succeeds.

pub mod assignment;
pub mod intake;
pub mod registry;
pub mod submission;
pub mod tracking;
pub mod transition;
pub mod visibility;

pub use assignment::assign_concern;
pub use intake::{attach_media, report_accident};
pub use registry::{register_device, register_user, set_device_enabled};
pub use submission::{soft_delete_concern, submit_concern};
pub use transition::{TransitionEngine, TransitionOutcome};
pub use visibility::{load_visible_accident, load_visible_concern};

use bantay_common::db::RuntimeSettings;
use bantay_common::events::EventBus;
use sqlx::SqlitePool;

/// Handles shared by the workflow operations
#[derive(Clone)]
pub struct WorkflowContext {
    pub db: SqlitePool,
    pub events: EventBus,
    pub settings: RuntimeSettings,
}

impl WorkflowContext {
    pub fn new(db: SqlitePool, events: EventBus, settings: RuntimeSettings) -> Self {
        Self { db, events, settings }
    }
}
