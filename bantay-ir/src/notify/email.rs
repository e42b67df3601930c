//! Email notifications

use async_trait::async_trait;
use bantay_common::events::BantayEvent;
use bantay_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use super::dispatcher::EventHandler;
use super::recipients::resolve_recipient;
use super::templates::{email_message, EmailMessage};
use super::GATEWAY_TIMEOUT;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, message: &EmailMessage) -> Result<()>;
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts `{from, to, subject, text}` JSON to a transactional email API
pub struct HttpEmailSender {
    http_client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from_address: String,
}

impl HttpEmailSender {
    pub fn new(url: impl Into<String>, api_key: Option<String>, from_address: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(format!("Email client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.into(),
            api_key,
            from_address: from_address.into(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send_email(&self, to: &str, message: &EmailMessage) -> Result<()> {
        let mut request = self.http_client.post(&self.url).json(&EmailRequest {
            from: &self.from_address,
            to,
            subject: &message.subject,
            text: &message.body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Email API unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Email API returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }
        Ok(())
    }
}

/// Used when no email API is configured
pub struct LogOnlyEmail;

#[async_trait]
impl EmailSender for LogOnlyEmail {
    async fn send_email(&self, to: &str, message: &EmailMessage) -> Result<()> {
        info!(to, subject = %message.subject, "Email (no sender configured)");
        Ok(())
    }
}

pub struct EmailNotifier {
    db: SqlitePool,
    sender: Arc<dyn EmailSender>,
}

impl EmailNotifier {
    pub fn new(db: SqlitePool, sender: Arc<dyn EmailSender>) -> Self {
        Self { db, sender }
    }
}

#[async_trait]
impl EventHandler for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn handle(&self, event: &BantayEvent) -> Result<()> {
        let Some(user) = resolve_recipient(&self.db, event).await? else {
            debug!(event = event.event_type(), "No email recipient");
            return Ok(());
        };
        let Some(address) = user.email.as_deref() else {
            debug!(user_id = %user.id, "Recipient has no email address");
            return Ok(());
        };
        let Some(message) = email_message(event, &user.name) else {
            return Ok(());
        };

        self.sender.send_email(address, &message).await
    }
}
