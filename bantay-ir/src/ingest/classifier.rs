//! Emergency classification of device snapshots
//!
//! `HttpClassifier` asks an external vision service; `ThresholdClassifier`
//! decides locally from the on-device detections and is the fallback when
//! the service is unavailable.

use async_trait::async_trait;
use bantay_common::models::{Category, DetectedObject, Severity};
use bantay_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

const USER_AGENT: &str = concat!("bantay-ir/", env!("CARGO_PKG_VERSION"));
/// Stays under the request deadline so the fallback can still answer
const CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(5);

/// What a classifier sees
#[derive(Debug, Clone, Copy)]
pub struct ClassificationInput<'a> {
    pub device_id: Uuid,
    pub image: &'a [u8],
    pub mime_type: &'a str,
    pub detections: &'a [DetectedObject],
}

/// Verdict on one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// True for a genuine emergency, false for a false alarm
    pub emergency: bool,
    pub confidence: f32,
    #[serde(default)]
    pub labels: Vec<DetectedObject>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn classify(&self, input: &ClassificationInput<'_>) -> Result<Classification>;
}

/// Local rule: any configured emergency label at or above the threshold
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    emergency_labels: HashSet<String>,
    threshold: f32,
}

impl ThresholdClassifier {
    pub fn new(emergency_labels: impl IntoIterator<Item = String>, threshold: f32) -> Self {
        Self {
            emergency_labels: emergency_labels.into_iter().map(|l| l.to_lowercase()).collect(),
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Synchronous core shared by the trait impl and the ingestion fallback
    pub fn evaluate(&self, detections: &[DetectedObject]) -> Classification {
        let hits: Vec<DetectedObject> = detections
            .iter()
            .filter(|d| {
                d.confidence >= self.threshold
                    && self.emergency_labels.contains(&d.label.to_lowercase())
            })
            .cloned()
            .collect();

        let best = hits
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        match best {
            Some(top) => Classification {
                emergency: true,
                confidence: top.confidence,
                category: Some(category_for_label(&top.label)),
                severity: Some(severity_for_confidence(top.confidence)),
                labels: hits.clone(),
            },
            None => Classification {
                emergency: false,
                confidence: detections.iter().map(|d| d.confidence).fold(0.0, f32::max),
                labels: Vec::new(),
                category: None,
                severity: None,
            },
        }
    }
}

#[async_trait]
impl Classifier for ThresholdClassifier {
    fn name(&self) -> &'static str {
        "threshold"
    }

    async fn classify(&self, input: &ClassificationInput<'_>) -> Result<Classification> {
        Ok(self.evaluate(input.detections))
    }
}

fn category_for_label(label: &str) -> Category {
    match label.to_lowercase().as_str() {
        "weapon" | "fight" | "intruder" => Category::Security,
        "flood" | "landslide" => Category::Environment,
        "fire" | "smoke" | "accident" => Category::Safety,
        _ => Category::Other,
    }
}

fn severity_for_confidence(confidence: f32) -> Severity {
    if confidence >= 0.85 {
        Severity::High
    } else if confidence >= 0.65 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Remote vision service.
///
/// POSTs the raw image with the detector output in query parameters and
/// expects a `Classification` JSON body.
pub struct HttpClassifier {
    http_client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(CLASSIFIER_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(format!("Classifier client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn classify(&self, input: &ClassificationInput<'_>) -> Result<Classification> {
        let detections = serde_json::to_string(input.detections)
            .map_err(|e| Error::Internal(format!("Failed to serialize detections: {}", e)))?;

        tracing::debug!(device_id = %input.device_id, bytes = input.image.len(), "Querying classifier");

        let response = self
            .http_client
            .post(&self.url)
            .query(&[
                ("device_id", input.device_id.to_string()),
                ("detections", detections),
            ])
            .header(reqwest::header::CONTENT_TYPE, input.mime_type)
            .body(input.image.to_vec())
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Classifier request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Classifier returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let classification: Classification = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Classifier response unreadable: {}", e)))?;

        if !(0.0..=1.0).contains(&classification.confidence) {
            return Err(Error::Upstream(format!(
                "Classifier confidence {} outside [0, 1]",
                classification.confidence
            )));
        }

        Ok(classification)
    }
}
