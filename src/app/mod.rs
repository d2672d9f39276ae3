//! Main application modules.
//!
//! This module provides progress logging, shutdown handling and statistics
//! printing used by the pipeline driver and the binary.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::{log_progress, spawn_progress_logger};
pub use shutdown::{cancel_on_signal, shutdown_gracefully};
pub use statistics::print_drop_statistics;
