//! Detection ingestion adapter
//!
//! Flow for one upload:
//! 1. Resolve the device (unknown or disabled devices are rejected)
//! 2. Validate the snapshot (size, sniffed image type, detection confidences)
//! 3. Classify (remote classifier, falling back to the local threshold rule)
//! 4. Genuine emergency: store under `cctv_detection`, then create the
//!    concern, its media and (if the device has a default handler) its
//!    distribution in one unit of work
//! 5. False alarm: store under `device_snapshot` and record the media
//!    against the device with `false_alarm = true`
//!
//! A snapshot is never dropped once it has passed validation.

use bantay_common::db::retry_on_contention;
use bantay_common::events::BantayEvent;
use bantay_common::models::{
    Category, Concern, ConcernStatus, DetectedObject, DetectionMetadata, Device, Distribution,
    IncidentMedia, MediaCategory, MediaSource, OriginType,
};
use bantay_common::{time, uuid_utils, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::classifier::{Classification, ClassificationInput, Classifier, ThresholdClassifier};
use super::media_store::{sniff_image, MediaStore, SniffedMedia, StoredMedia};
use crate::db::{devices, media};
use crate::workflow::assignment::distribute;
use crate::workflow::submission::insert_with_tracking_code;
use crate::workflow::WorkflowContext;

/// One snapshot posted by a device
#[derive(Debug, Clone)]
pub struct DetectionUpload {
    pub device_id: Uuid,
    pub image: Vec<u8>,
    pub detected_at: Option<DateTime<Utc>>,
    pub detections: Vec<DetectedObject>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub media_id: Uuid,
    pub false_alarm: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concern_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
    /// Whether a distribution was created for the device's default handler
    pub assigned: bool,
    /// Classifier that produced the verdict
    pub classified_by: &'static str,
}

pub struct DetectionIngestor {
    ctx: WorkflowContext,
    store: MediaStore,
    classifier: Option<Arc<dyn Classifier>>,
    fallback: ThresholdClassifier,
}

impl DetectionIngestor {
    /// `classifier` None means the threshold rule decides alone
    pub fn new(
        ctx: WorkflowContext,
        store: MediaStore,
        classifier: Option<Arc<dyn Classifier>>,
        fallback: ThresholdClassifier,
    ) -> Self {
        Self {
            ctx,
            store,
            classifier,
            fallback,
        }
    }

    pub async fn ingest(&self, upload: DetectionUpload) -> Result<IngestOutcome> {
        let device = devices::get_device(&self.ctx.db, upload.device_id)
            .await?
            .filter(|d| d.enabled)
            .ok_or_else(|| {
                Error::Validation(format!("Unknown or disabled device {}", upload.device_id))
            })?;

        let sniffed = self.validate_image(&upload.image)?;
        let reported = DetectionMetadata::from_objects(upload.detections.clone())?;

        let (classification, classified_by) = self.classify(&upload, &sniffed).await;

        let objects = if reported.objects.is_empty() {
            classification.labels.clone()
        } else {
            reported.objects
        };
        let detection = DetectionMetadata {
            confidence: classification.confidence,
            objects,
        };

        let mut outcome = if classification.emergency {
            self.raise_concern(&device, &upload, &sniffed, &classification, detection)
                .await?
        } else {
            self.record_false_alarm(&device, &upload, &sniffed, detection)
                .await?
        };
        outcome.classified_by = classified_by;

        Ok(outcome)
    }

    fn validate_image(&self, image: &[u8]) -> Result<SniffedMedia> {
        if image.is_empty() {
            return Err(Error::Validation("Image is empty".to_string()));
        }
        let max = self.ctx.settings.ingest_max_image_bytes;
        if image.len() > max {
            return Err(Error::Validation(format!(
                "Image is {} bytes, limit is {}",
                image.len(),
                max
            )));
        }
        sniff_image(image)
    }

    async fn classify(
        &self,
        upload: &DetectionUpload,
        sniffed: &SniffedMedia,
    ) -> (Classification, &'static str) {
        if let Some(classifier) = &self.classifier {
            let input = ClassificationInput {
                device_id: upload.device_id,
                image: &upload.image,
                mime_type: sniffed.mime_type,
                detections: &upload.detections,
            };
            match classifier.classify(&input).await {
                Ok(verdict) => return (verdict, classifier.name()),
                Err(e) => {
                    warn!(
                        device_id = %upload.device_id,
                        classifier = classifier.name(),
                        "Classifier failed, using threshold rule: {}",
                        e
                    );
                }
            }
        }
        (self.fallback.evaluate(&upload.detections), self.fallback_name())
    }

    fn fallback_name(&self) -> &'static str {
        Classifier::name(&self.fallback)
    }

    async fn raise_concern(
        &self,
        device: &Device,
        upload: &DetectionUpload,
        sniffed: &SniffedMedia,
        classification: &Classification,
        detection: DetectionMetadata,
    ) -> Result<IngestOutcome> {
        let stored = self
            .store
            .store(MediaCategory::CctvDetection, &upload.image, sniffed.extension)
            .await?;

        let now = time::now();
        let headline = classification
            .labels
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|o| capitalize(&o.label))
            .unwrap_or_else(|| "Emergency".to_string());

        let template = Concern {
            id: uuid_utils::generate(),
            tracking_code: String::new(),
            origin: OriginType::DeviceDetected,
            category: classification.category.unwrap_or(Category::Safety),
            severity: classification.severity,
            status: ConcernStatus::Pending,
            location: device.location,
            title: format!("{} detected by {}", headline, device.name),
            description: device.location_label.clone(),
            submitted_by: None,
            version: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let media_record = media_row(
            MediaSource::Concern(template.id),
            MediaCategory::CctvDetection,
            sniffed,
            stored,
            detection,
            false,
            upload.detected_at,
            now,
        );

        let max_attempts = self.ctx.settings.tracking_code_max_attempts;
        let handler_id = device.default_handler_id;
        let ctx = &self.ctx;

        let (concern, distribution): (Concern, Option<Distribution>) = retry_on_contention(
            "ingest_detection",
            ctx.settings.db_max_lock_wait_ms,
            || {
                let template = template.clone();
                let media_record = &media_record;
                async move {
                    let mut tx = ctx.db.begin().await?;
                    let concern = insert_with_tracking_code(&mut *tx, template, max_attempts).await?;
                    media::insert_media(&mut *tx, media_record).await?;
                    let distribution = match handler_id {
                        Some(handler_id) => Some(distribute(&mut *tx, &concern, handler_id, now).await?),
                        None => None,
                    };
                    tx.commit().await?;
                    Ok((concern, distribution))
                }
            },
        )
        .await?;

        info!(
            device_id = %device.id,
            concern_id = %concern.id,
            tracking_code = %concern.tracking_code,
            confidence = classification.confidence,
            assigned = distribution.is_some(),
            "Detection raised a concern"
        );

        ctx.events.publish(BantayEvent::ConcernSubmitted {
            concern: concern.clone(),
            timestamp: now,
        });
        if let Some(distribution) = &distribution {
            ctx.events.publish(BantayEvent::ConcernAssigned {
                concern: concern.clone(),
                distribution: distribution.clone(),
                timestamp: now,
            });
        }

        Ok(IngestOutcome {
            media_id: media_record.id,
            false_alarm: false,
            concern_id: Some(concern.id),
            tracking_code: Some(concern.tracking_code),
            assigned: distribution.is_some(),
            classified_by: "unknown",
        })
    }

    async fn record_false_alarm(
        &self,
        device: &Device,
        upload: &DetectionUpload,
        sniffed: &SniffedMedia,
        detection: DetectionMetadata,
    ) -> Result<IngestOutcome> {
        let stored = self
            .store
            .store(MediaCategory::DeviceSnapshot, &upload.image, sniffed.extension)
            .await?;

        let now = time::now();
        let confidence = detection.confidence;
        let record = media_row(
            MediaSource::Device(device.id),
            MediaCategory::DeviceSnapshot,
            sniffed,
            stored,
            detection,
            true,
            upload.detected_at,
            now,
        );

        retry_on_contention(
            "record_false_alarm",
            self.ctx.settings.db_max_lock_wait_ms,
            || media::insert_media(&self.ctx.db, &record),
        )
        .await?;

        info!(
            device_id = %device.id,
            media_id = %record.id,
            confidence,
            "Detection dismissed as false alarm"
        );

        self.ctx.events.publish(BantayEvent::DetectionDismissed {
            media_id: record.id,
            device_id: device.id,
            confidence,
            timestamp: now,
        });

        Ok(IngestOutcome {
            media_id: record.id,
            false_alarm: true,
            concern_id: None,
            tracking_code: None,
            assigned: false,
            classified_by: "unknown",
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn media_row(
    source: MediaSource,
    category: MediaCategory,
    sniffed: &SniffedMedia,
    stored: StoredMedia,
    detection: DetectionMetadata,
    false_alarm: bool,
    captured_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> IncidentMedia {
    IncidentMedia {
        id: uuid_utils::generate(),
        source,
        category,
        kind: sniffed.kind,
        storage_path: stored.relative_path,
        mime_type: sniffed.mime_type.to_string(),
        byte_size: stored.byte_size,
        sha256: stored.sha256,
        detection: Some(detection),
        false_alarm,
        captured_at,
        created_at: now,
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
