//! Incident media attachments
//!
//! A media row points at exactly one source entity. The source is a tagged
//! union stored as a `(source_type, source_id)` column pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

closed_set! {
    /// Why the media was captured
    MediaCategory, "media category" {
        CitizenConcern => "citizen_concern",
        DeviceSnapshot => "device_snapshot",
        CctvDetection => "cctv_detection",
    }
}

closed_set! {
    MediaKind, "media kind" {
        Image => "image",
        Audio => "audio",
    }
}

closed_set! {
    /// Discriminant of [`MediaSource`]
    MediaSourceKind, "media source" {
        Concern => "concern",
        Accident => "accident",
        Device => "device",
    }
}

/// Entity a media attachment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum MediaSource {
    Concern(Uuid),
    Accident(Uuid),
    Device(Uuid),
}

impl MediaSource {
    pub fn kind(&self) -> MediaSourceKind {
        match self {
            MediaSource::Concern(_) => MediaSourceKind::Concern,
            MediaSource::Accident(_) => MediaSourceKind::Accident,
            MediaSource::Device(_) => MediaSourceKind::Device,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            MediaSource::Concern(id) | MediaSource::Accident(id) | MediaSource::Device(id) => *id,
        }
    }

    /// Rebuild from the stored discriminant and id
    pub fn from_parts(kind: MediaSourceKind, id: Uuid) -> Self {
        match kind {
            MediaSourceKind::Concern => MediaSource::Concern(id),
            MediaSourceKind::Accident => MediaSource::Accident(id),
            MediaSourceKind::Device => MediaSource::Device(id),
        }
    }
}

/// One object reported by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f32,
}

/// Detector output attached to AI-sourced media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetadata {
    /// Highest confidence among `objects` (or the classifier's own score)
    pub confidence: f32,
    pub objects: Vec<DetectedObject>,
}

impl DetectionMetadata {
    pub fn from_objects(objects: Vec<DetectedObject>) -> Result<Self> {
        for obj in &objects {
            if !(0.0..=1.0).contains(&obj.confidence) {
                return Err(Error::Validation(format!(
                    "Detection '{}' confidence {} outside [0, 1]",
                    obj.label, obj.confidence
                )));
            }
        }
        let confidence = objects
            .iter()
            .map(|o| o.confidence)
            .fold(0.0_f32, f32::max);
        Ok(Self { confidence, objects })
    }
}

/// Stored attachment; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentMedia {
    pub id: Uuid,
    pub source: MediaSource,
    pub category: MediaCategory,
    pub kind: MediaKind,
    /// Path relative to the media root
    pub storage_path: String,
    pub mime_type: String,
    pub byte_size: i64,
    pub sha256: String,
    pub detection: Option<DetectionMetadata>,
    pub false_alarm: bool,
    pub captured_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
