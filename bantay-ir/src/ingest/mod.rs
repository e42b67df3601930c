//! Detection ingestion
//!
//! Accepts snapshots from field devices, classifies them and either raises
//! a device-detected concern or records a false alarm.

pub mod classifier;
pub mod detection;
pub mod media_store;

pub use classifier::{Classification, ClassificationInput, Classifier, HttpClassifier, ThresholdClassifier};
pub use detection::{DetectionIngestor, DetectionUpload, IngestOutcome};
pub use media_store::{MediaStore, StoredMedia};
