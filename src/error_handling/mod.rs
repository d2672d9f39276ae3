//! Error handling and pipeline statistics.
//!
//! This module provides:
//! - Error type definitions for every pipeline stage
//! - Drop-reason statistics shared with the progress logger
//!
//! Errors fall into three groups:
//! - **Fatal**: initialization and schema provisioning failures
//! - **Recoverable**: read, parse, lookup and write failures for a single line or batch
//! - **Silent drops**: lines without a public address

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    ConfigError, DropReason, InitializationError, LookupError, SchemaError, SourceError,
    WriteError,
};
