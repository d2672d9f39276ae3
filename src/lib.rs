//! geostat library: follow a log file and ship geolocated hit counts to InfluxDB
//!
//! Every new line of the followed file is scanned for its first IPv4 address.
//! Public addresses are resolved against a MaxMind City database, tagged with
//! a geohash and the local hostname, batched, and written to InfluxDB as line
//! protocol points (`count=1i`) over UDP or HTTP.
//!
//! # Example
//!
//! ```no_run
//! use geostat::{run_pipeline, Config, Settings};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     log_file: "/var/log/nginx/access.log".into(),
//!     geo_db: "GeoLite2-City.mmdb".into(),
//!     settings: Settings::load(None)?,
//! };
//!
//! let cancel = CancellationToken::new();
//! let report = run_pipeline(config, cancel).await?;
//! println!("{} lines, {} points written", report.lines_read, report.points_written);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
mod error_handling;
pub mod extract;
mod geoip;
pub mod initialization;
mod run;
mod source;
pub mod storage;

// Re-export public API
pub use crate::app::cancel_on_signal;
pub use crate::config::{Config, DbSettings, LogFormat, LogLevel, Opt, Settings, Transport};
pub use crate::error_handling::{
    ConfigError, DropReason, InitializationError, LookupError, ProcessingStats, SchemaError,
    SourceError, WriteError,
};
pub use crate::geoip::{build_point, CityFields, GeoIpMetadata, GeoPoint, GeoResolver, Resolver};
pub use crate::run::{run_pipeline, Pipeline, PipelineReport, PipelineState};
pub use crate::source::{LineSource, RawLine};
pub use crate::storage::{BatchConfig, PointWriter, StoreWriter};
