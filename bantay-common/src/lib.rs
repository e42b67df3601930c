//! # Bantay Common Library
//!
//! Shared code for the Bantay incident-reporting services:
//! - Domain models and closed status enums
//! - Event types (BantayEvent enum) and the EventBus
//! - Database initialization, settings and contention retry
//! - API request authentication and response envelope
//! - Configuration loading
//! - Utility functions

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
