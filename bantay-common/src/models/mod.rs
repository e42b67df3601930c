//! Domain models
//!
//! Every enum here is a closed set. Values are parsed with `FromStr` at each
//! boundary (request bodies, query strings and rows read back from storage);
//! an unknown value is a `Validation` error, never silently defaulted.

/// Declares a closed string-valued enum with `as_str`, `FromStr`, `Display`
/// and snake_case serde representation.
macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member of the set, in declaration order
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Storage and wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(crate::Error::Validation(format!(
                        "Unknown {} '{}' (expected one of: {})",
                        $what,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

mod actor;
mod concern;
mod device;
mod distribution;
mod history;
mod media;
mod status;

pub use actor::{Actor, ActorRole, NewUser, User};
pub use concern::{Accident, Category, Concern, GeoPoint, NewAccident, NewConcern, OriginType, Severity};
pub use device::{Device, NewDevice};
pub use distribution::Distribution;
pub use history::{HistoryEntry, DEFAULT_REMARKS};
pub use media::{
    DetectedObject, DetectionMetadata, IncidentMedia, MediaCategory, MediaKind, MediaSource,
    MediaSourceKind,
};
pub use status::{ConcernStatus, DistributionStatus};
