//! API module for shared HTTP API functionality
//!
//! Contains ONLY framework-independent pieces: request-signature
//! validation, the shared-secret store and the response envelope. The
//! service wraps these in axum middleware and extractors.

pub mod auth;
pub mod types;

pub use auth::{
    calculate_hash, initialize_shared_secret, load_shared_secret, to_canonical_json,
    validate_hash, validate_timestamp, ApiAuthError,
};
pub use types::ApiResponse;
