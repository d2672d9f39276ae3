//! Configuration constants.
//!
//! This module defines the defaults and fixed operational parameters used
//! throughout the pipeline.

use std::time::Duration;

/// Default configuration file base name (extension picked by the `config` crate)
pub const DEFAULT_CONFIG_NAME: &str = "config";
/// Prefix for environment variable overrides, e.g. `GEOSTAT_DB__HOST`
pub const ENV_PREFIX: &str = "GEOSTAT";
/// Default MaxMind City database path
pub const DEFAULT_GEO_DB: &str = "GeoLite2-City.mmdb";

// Store defaults
pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
/// InfluxDB UDP listener port
pub const DEFAULT_DB_PORT: u16 = 8089;
/// InfluxDB HTTP API port
pub const DEFAULT_DB_TCP_PORT: u16 = 8086;
pub const DEFAULT_DATABASE: &str = "geostat";
pub const DEFAULT_MEASUREMENT: &str = "geo";
pub const DEFAULT_RETENTION_POLICY_NAME: &str = "geostat_rp";
pub const DEFAULT_RETENTION_POLICY_VALUE: &str = "30d";
/// Flush when this many points are buffered
pub const DEFAULT_FULL_SIZE: usize = 100;
/// Flush when this many seconds passed since the last flush
pub const DEFAULT_INSERT_TIME_INTERVAL_SECS: u64 = 10;
/// HTTP request timeout for confirmed writes and schema queries
pub const DEFAULT_DB_TIMEOUT_SECS: u64 = 10;
/// Retained points are capped at `full_size * RETAIN_FACTOR` unless configured
pub const RETAIN_FACTOR: usize = 10;

// Geo defaults
/// Geohash length; 12 characters is the maximum the encoder supports
pub const DEFAULT_GEOHASH_PRECISION: usize = 12;
pub const MAX_GEOHASH_PRECISION: usize = 12;

// Line source
/// Poll interval for new data on an idle file
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
/// Fixed backoff after a read error before reopening the file
pub const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);
/// Maximum bytes read from the followed file per poll
pub const MAX_READ_CHUNK_BYTES: usize = 1024 * 1024;

// UDP
/// Keep each datagram safely below the 64 KiB UDP payload limit
pub const MAX_UDP_PAYLOAD_BYTES: usize = 64 * 1024 - 512;

/// Interval between progress log lines
pub const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Maximum response body length kept in error messages
pub const MAX_ERROR_BODY_LEN: usize = 512;

// Pipeline
/// Bounds on how often the driver re-checks the time-based flush trigger
pub const MIN_FLUSH_TICK: Duration = Duration::from_millis(50);
pub const MAX_FLUSH_TICK: Duration = Duration::from_secs(1);
/// After a failed write the batch waits one flush interval, kept within these bounds
pub const MIN_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);
