//! UUID utilities
//!
//! Identifiers are stored as hyphenated text.

use uuid::Uuid;

use crate::{Error, Result};

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> std::result::Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Parse an identifier read back from storage
pub fn from_storage(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Invalid stored id '{}': {}", s, e)))
}

/// Parse an optional identifier read back from storage
pub fn from_storage_opt(s: Option<String>) -> Result<Option<Uuid>> {
    s.as_deref().map(from_storage).transpose()
}
