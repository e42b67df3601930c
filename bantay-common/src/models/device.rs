//! Registered detection devices (CCTV cameras running on-device detection)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub location_label: Option<String>,
    pub location: Option<GeoPoint>,
    /// Disabled devices are rejected at ingestion
    pub enabled: bool,
    /// Purok leader who receives concerns raised by this device
    pub default_handler_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    #[serde(default)]
    pub location_label: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub default_handler_id: Option<Uuid>,
}
