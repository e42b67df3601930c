//! bantay-ir library interface
//!
//! Incident reporting service: concern workflow, detection ingestion and
//! notification dispatch behind an axum HTTP API. Exposed as a library so
//! integration tests can build the router directly.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use bantay_common::db::RuntimeSettings;
use bantay_common::events::EventBus;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::ingest::{Classifier, DetectionIngestor, MediaStore, ThresholdClassifier};
use crate::workflow::{TransitionEngine, WorkflowContext};

/// Per-request deadline for `/api`; SSE streams are exempt
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Multipart overhead allowed on top of the media size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Domain events for the dispatcher and SSE clients
    pub event_bus: EventBus,
    pub settings: RuntimeSettings,
    /// Request signing secret (0 disables checking)
    pub shared_secret: i64,
    pub media_store: MediaStore,
    pub transitions: TransitionEngine,
    pub ingestor: Arc<DetectionIngestor>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        settings: RuntimeSettings,
        shared_secret: i64,
        media_store: MediaStore,
        classifier: Option<Arc<dyn Classifier>>,
        emergency_labels: Vec<String>,
    ) -> Self {
        let ctx = WorkflowContext::new(db.clone(), event_bus.clone(), settings.clone());
        let fallback =
            ThresholdClassifier::new(emergency_labels, settings.detection_confidence_threshold);
        let ingestor = DetectionIngestor::new(ctx.clone(), media_store.clone(), classifier, fallback);

        Self {
            db,
            event_bus,
            settings,
            shared_secret,
            media_store,
            transitions: TransitionEngine::new(ctx),
            ingestor: Arc::new(ingestor),
            startup_time: Utc::now(),
        }
    }

    /// Handles for workflow operations
    pub fn workflow(&self) -> WorkflowContext {
        WorkflowContext::new(self.db.clone(), self.event_bus.clone(), self.settings.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.settings.ingest_max_image_bytes + MULTIPART_OVERHEAD_BYTES;

    let api = api::concern_routes()
        .merge(api::accident_routes())
        .merge(api::user_routes())
        .merge(api::device_routes())
        .merge(api::distribution_routes())
        .merge(api::media_routes())
        .merge(api::detection_routes())
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(axum::middleware::from_fn_with_state(
            REQUEST_TIMEOUT,
            api::timeout_middleware,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    Router::new()
        .nest("/api", api)
        .merge(api::track_routes())
        .merge(api::health_routes())
        .merge(api::event_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
