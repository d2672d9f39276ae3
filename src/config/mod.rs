//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, limits, intervals)
//! - CLI option types and parsing
//! - File/environment settings (`db.*`, `geo.*`, `source.*`)

mod constants;
mod settings;
mod types;

// Re-export all constants
pub use constants::*;
pub use settings::{DbSettings, GeoSettings, RetentionPolicy, Settings, SourceSettings, Transport};
pub use types::{Config, LogFormat, LogLevel, Opt};
