//! SMS notifications

use async_trait::async_trait;
use bantay_common::events::BantayEvent;
use bantay_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use super::dispatcher::EventHandler;
use super::recipients::resolve_recipient;
use super::templates::sms_text;
use super::GATEWAY_TIMEOUT;

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send_sms(&self, to: &str, message: &str) -> Result<()>;
}

#[derive(Serialize)]
struct SmsRequest<'a> {
    to: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<&'a str>,
}

/// Posts `{to, message, sender}` JSON to a gateway endpoint
pub struct HttpSmsGateway {
    http_client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    sender_name: Option<String>,
}

impl HttpSmsGateway {
    pub fn new(url: impl Into<String>, api_key: Option<String>, sender_name: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(format!("SMS client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.into(),
            api_key,
            sender_name,
        })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send_sms(&self, to: &str, message: &str) -> Result<()> {
        let mut request = self.http_client.post(&self.url).json(&SmsRequest {
            to,
            message,
            sender: self.sender_name.as_deref(),
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("SMS gateway unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "SMS gateway returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }
        Ok(())
    }
}

/// Used when no gateway is configured
pub struct LogOnlySms;

#[async_trait]
impl SmsGateway for LogOnlySms {
    async fn send_sms(&self, to: &str, message: &str) -> Result<()> {
        info!(to, text = message, "SMS (no gateway configured)");
        Ok(())
    }
}

pub struct SmsNotifier {
    db: SqlitePool,
    gateway: Arc<dyn SmsGateway>,
}

impl SmsNotifier {
    pub fn new(db: SqlitePool, gateway: Arc<dyn SmsGateway>) -> Self {
        Self { db, gateway }
    }
}

#[async_trait]
impl EventHandler for SmsNotifier {
    fn name(&self) -> &'static str {
        "sms"
    }

    async fn handle(&self, event: &BantayEvent) -> Result<()> {
        let Some(text) = sms_text(event) else {
            return Ok(());
        };
        let Some(phone) = resolve_recipient(&self.db, event)
            .await?
            .and_then(|user| user.phone)
        else {
            debug!(event = event.event_type(), "No SMS recipient");
            return Ok(());
        };

        self.gateway.send_sms(&phone, &text).await
    }
}
