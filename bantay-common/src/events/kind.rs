//! Event discriminants used for subscription registration

use serde::{Deserialize, Serialize};

/// Kind of [`super::BantayEvent`], without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventKind {
    ConcernSubmitted,
    ConcernAssigned,
    ConcernStatusUpdated,
    DetectionDismissed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ConcernSubmitted => "ConcernSubmitted",
            EventKind::ConcernAssigned => "ConcernAssigned",
            EventKind::ConcernStatusUpdated => "ConcernStatusUpdated",
            EventKind::DetectionDismissed => "DetectionDismissed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
