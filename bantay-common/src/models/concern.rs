//! Concern and accident records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ConcernStatus;
use crate::{Error, Result};

closed_set! {
    /// How a concern entered the system
    OriginType, "origin type" {
        Manual => "manual",
        Voice => "voice",
        DeviceDetected => "device_detected",
    }
}

closed_set! {
    /// Concern category
    Category, "category" {
        Safety => "safety",
        Security => "security",
        Infrastructure => "infrastructure",
        Environment => "environment",
        Noise => "noise",
        Other => "other",
    }
}

closed_set! {
    /// Reported severity
    Severity, "severity" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// Validated latitude/longitude pair (WGS 84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::Validation(format!(
                "Latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::Validation(format!(
                "Longitude {} outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self { latitude, longitude })
    }

    /// Build from optional columns/fields; both or neither must be present
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Self>> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(Error::Validation(
                "Latitude and longitude must be supplied together".to_string(),
            )),
        }
    }
}

/// A citizen- or device-originated incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concern {
    pub id: Uuid,
    /// Unique human-readable code given to the reporter (e.g. BNT-20261017-7K3QXM)
    pub tracking_code: String,
    pub origin: OriginType,
    pub category: Category,
    pub severity: Option<Severity>,
    pub status: ConcernStatus,
    pub location: Option<GeoPoint>,
    pub title: String,
    pub description: Option<String>,
    /// Submitting citizen; None for anonymous and device-detected concerns
    pub submitted_by: Option<Uuid>,
    /// Optimistic concurrency counter, bumped on every status change
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Concern {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Submission payload for a new concern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConcern {
    #[serde(default = "default_origin")]
    pub origin: OriginType,
    pub category: Category,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_origin() -> OriginType {
    OriginType::Manual
}

impl NewConcern {
    /// Check free-text and coordinate fields; returns the validated location
    pub fn validate(&self) -> Result<Option<GeoPoint>> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Title must not be empty".to_string()));
        }
        if self.title.chars().count() > 200 {
            return Err(Error::Validation("Title exceeds 200 characters".to_string()));
        }
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

/// Accident report, a media source distinct from concerns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accident {
    pub id: Uuid,
    pub concern_id: Option<Uuid>,
    pub reported_by: Option<Uuid>,
    pub description: String,
    pub location: Option<GeoPoint>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Submission payload for an accident report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccident {
    #[serde(default)]
    pub concern_id: Option<Uuid>,
    pub description: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_concern() -> NewConcern {
        NewConcern {
            origin: OriginType::Manual,
            category: Category::Infrastructure,
            severity: None,
            latitude: Some(10.3157),
            longitude: Some(123.8854),
            title: "Broken streetlight".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_geo_point_bounds() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert!(matches!(GeoPoint::new(90.5, 0.0), Err(Error::Validation(_))));
        assert!(matches!(GeoPoint::new(0.0, -181.0), Err(Error::Validation(_))));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_geo_point_requires_both_parts() {
        assert_eq!(GeoPoint::from_parts(None, None).unwrap(), None);
        assert!(GeoPoint::from_parts(Some(1.0), None).is_err());
        assert!(GeoPoint::from_parts(None, Some(1.0)).is_err());
    }

    #[test]
    fn test_new_concern_validation() {
        let loc = new_concern().validate().unwrap().unwrap();
        assert_eq!(loc.latitude, 10.3157);

        let mut blank = new_concern();
        blank.title = "   ".to_string();
        assert!(matches!(blank.validate(), Err(Error::Validation(_))));

        let mut half = new_concern();
        half.longitude = None;
        assert!(half.validate().is_err());
    }

    #[test]
    fn test_new_concern_defaults_origin() {
        let parsed: NewConcern =
            serde_json::from_str(r#"{"category": "noise", "title": "Karaoke past midnight"}"#)
                .unwrap();
        assert_eq!(parsed.origin, OriginType::Manual);
        assert_eq!(parsed.category, Category::Noise);
        assert!(parsed.severity.is_none());
    }

    #[test]
    fn test_new_concern_rejects_unknown_category() {
        let parsed = serde_json::from_str::<NewConcern>(r#"{"category": "weather", "title": "Flood"}"#);
        assert!(parsed.is_err());
    }
}
