//! Notification dispatch
//!
//! Consumes domain events after commit and turns them into SMS and email
//! messages. Delivery failures are retried and logged; they never reach the
//! workflow.

pub mod dispatcher;
pub mod email;
pub mod recipients;
pub mod sms;
pub mod templates;

pub use dispatcher::{deliver_with_retry, Dispatcher, EventHandler, RetryPolicy};
pub use email::{EmailNotifier, EmailSender, HttpEmailSender, LogOnlyEmail};
pub use sms::{HttpSmsGateway, LogOnlySms, SmsGateway, SmsNotifier};

use bantay_common::config::TomlConfig;
use bantay_common::events::EventKind;
use bantay_common::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Request timeout for outbound SMS and email calls
pub const GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_FROM_ADDRESS: &str = "no-reply@bantay.local";

/// Build the gateways from config, falling back to log-only delivery
pub fn build_gateways(config: &TomlConfig) -> Result<(Arc<dyn SmsGateway>, Arc<dyn EmailSender>)> {
    let sms: Arc<dyn SmsGateway> = match &config.sms.gateway_url {
        Some(url) => {
            info!(url = %url, "SMS gateway configured");
            Arc::new(HttpSmsGateway::new(
                url.clone(),
                config.sms.api_key.clone(),
                config.sms.sender_name.clone(),
            )?)
        }
        None => {
            info!("No SMS gateway configured, SMS will be logged only");
            Arc::new(LogOnlySms)
        }
    };

    let email: Arc<dyn EmailSender> = match &config.email.api_url {
        Some(url) => {
            info!(url = %url, "Email API configured");
            Arc::new(HttpEmailSender::new(
                url.clone(),
                config.email.api_key.clone(),
                config
                    .email
                    .from_address
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            )?)
        }
        None => {
            info!("No email API configured, email will be logged only");
            Arc::new(LogOnlyEmail)
        }
    };

    Ok((sms, email))
}

/// The subscription table: who hears about what
pub fn register_notifiers(
    dispatcher: &mut Dispatcher,
    db: SqlitePool,
    sms: Arc<dyn SmsGateway>,
    email: Arc<dyn EmailSender>,
) {
    let sms_notifier: Arc<dyn EventHandler> = Arc::new(SmsNotifier::new(db.clone(), sms));
    let email_notifier: Arc<dyn EventHandler> = Arc::new(EmailNotifier::new(db, email));

    dispatcher
        .register(EventKind::ConcernStatusUpdated, Arc::clone(&sms_notifier))
        .register(EventKind::ConcernStatusUpdated, Arc::clone(&email_notifier))
        .register(EventKind::ConcernAssigned, sms_notifier)
        .register(EventKind::ConcernAssigned, email_notifier);
}
