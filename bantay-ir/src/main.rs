//! bantay-ir - Incident Reporting service
//!
//! Startup order:
//! 1. Logging and configuration (CLI, environment, config.toml)
//! 2. Database (schema and default settings) and runtime settings
//! 3. Event bus and notification dispatcher
//! 4. Classifier, ingestion and HTTP router

use anyhow::{Context, Result};
use bantay_common::api::load_shared_secret;
use bantay_common::db::{init_database, RuntimeSettings};
use bantay_common::events::EventBus;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bantay_ir::config::{Args, ServiceConfig};
use bantay_ir::ingest::{Classifier, HttpClassifier, MediaStore};
use bantay_ir::notify::{self, Dispatcher, RetryPolicy};
use bantay_ir::AppState;

/// Buffered events before a slow subscriber starts lagging
const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bantay_ir=info,bantay_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting bantay-ir {} (build {}, {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServiceConfig::resolve(&args).context("Failed to load configuration")?;

    let db = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let settings = RuntimeSettings::load(&db)
        .await
        .context("Failed to load runtime settings")?;
    let shared_secret = load_shared_secret(&db)
        .await
        .context("Failed to load API shared secret")?;
    if shared_secret == 0 {
        tracing::warn!("API request signing is disabled (shared secret is 0)");
    }

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

    let (sms, email) = notify::build_gateways(&config.toml).context("Failed to build gateways")?;
    let mut dispatcher = Dispatcher::new(RetryPolicy::from_settings(&settings));
    notify::register_notifiers(&mut dispatcher, db.clone(), sms, email);
    info!(
        subscriptions = dispatcher.subscription_count(),
        "Notification dispatcher ready"
    );
    dispatcher.spawn(&event_bus);

    let classifier: Option<Arc<dyn Classifier>> = match &config.classifier_url {
        Some(url) => Some(Arc::new(
            HttpClassifier::new(url.clone()).context("Failed to build classifier client")?,
        )),
        None => None,
    };

    let state = AppState::new(
        db,
        event_bus,
        settings,
        shared_secret,
        MediaStore::new(config.media_root.clone()),
        classifier,
        config.emergency_labels.clone(),
    );
    let app = bantay_ir::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
