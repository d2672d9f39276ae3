//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and the library-level configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::DEFAULT_GEO_DB;
use crate::config::settings::Settings;

/// `--log-level` values, mapped onto [`log::LevelFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    /// Includes one line per dropped record
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use log::LevelFilter as F;
        match level {
            LogLevel::Error => F::Error,
            LogLevel::Warn => F::Warn,
            LogLevel::Info => F::Info,
            LogLevel::Debug => F::Debug,
            LogLevel::Trace => F::Trace,
        }
    }
}

/// `--log-format` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Colored text for terminals
    Plain,
    /// One JSON object per line
    Json,
}

/// Command-line options.
///
/// Store settings live in the configuration file (see [`Settings`]); the CLI
/// only names the inputs and controls logging.
///
/// # Examples
///
/// ```bash
/// # Follow nginx access log with the default config.yaml in the working directory
/// geostat /var/log/nginx/access.log --geo-db /usr/share/GeoIP/GeoLite2-City.mmdb
///
/// # Explicit config file and JSON logs
/// geostat access.log --config /etc/geostat.toml --log-format json
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "geostat",
    about = "Follows a log file and ships geolocated IPv4 hit counts to InfluxDB."
)]
pub struct Opt {
    /// Log file to follow
    #[arg(value_parser)]
    pub log_file: PathBuf,

    /// MaxMind City database (.mmdb)
    #[arg(long, env = "GEOSTAT_GEO_DB", default_value = DEFAULT_GEO_DB)]
    pub geo_db: PathBuf,

    /// Configuration file (yaml, toml or json). Defaults to ./config.* if present.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use geostat::{Config, Settings};
/// use std::path::PathBuf;
///
/// let config = Config {
///     log_file: PathBuf::from("/var/log/nginx/access.log"),
///     geo_db: PathBuf::from("GeoLite2-City.mmdb"),
///     settings: Settings::default(),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// File to follow
    pub log_file: PathBuf,

    /// MaxMind City database path
    pub geo_db: PathBuf,

    /// Store, geo and source settings
    pub settings: Settings,
}

impl Config {
    /// Poll interval for the line source while the file is idle.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.source.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("access.log"),
            geo_db: PathBuf::from(DEFAULT_GEO_DB),
            settings: Settings::default(),
        }
    }
}
