//! File and environment based settings.
//!
//! Settings are read from a configuration file (any format the `config` crate
//! understands) and overlaid with `GEOSTAT_`-prefixed environment variables,
//! using `__` to separate nesting levels:
//!
//! ```bash
//! GEOSTAT_DB__HOST=influx.internal GEOSTAT_DB__FULL_SIZE=500 geostat access.log
//! ```

use std::path::Path;

use ::config::{Environment, File};
use serde::Deserialize;

use crate::config::constants::*;
use crate::error_handling::ConfigError;

/// Transport used to deliver points to InfluxDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Fire-and-forget line protocol datagrams to `db.host:db.port`
    #[default]
    Udp,
    /// Confirmed writes to `http://db.host:db.tcp_port/write`
    Http,
}

/// Retention policy created alongside the database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Policy name
    pub name: String,
    /// InfluxQL duration literal, e.g. `30d` or `INF`
    pub value: String,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            name: DEFAULT_RETENTION_POLICY_NAME.to_string(),
            value: DEFAULT_RETENTION_POLICY_VALUE.to_string(),
        }
    }
}

/// `db.*` settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub host: String,
    /// UDP listener port
    pub port: u16,
    /// HTTP API port (schema provisioning and confirmed writes)
    pub tcp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub measurement: String,
    pub retention_policy: RetentionPolicy,
    /// Flush once this many points are buffered
    pub full_size: usize,
    /// Flush once this many seconds passed since the last flush
    #[serde(alias = "insert_tim_int")]
    pub insert_time_interval: u64,
    pub transport: Transport,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on points kept for retry after failed writes
    pub max_retained: Option<usize>,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            tcp_port: DEFAULT_DB_TCP_PORT,
            username: None,
            password: None,
            database: DEFAULT_DATABASE.to_string(),
            measurement: DEFAULT_MEASUREMENT.to_string(),
            retention_policy: RetentionPolicy::default(),
            full_size: DEFAULT_FULL_SIZE,
            insert_time_interval: DEFAULT_INSERT_TIME_INTERVAL_SECS,
            transport: Transport::default(),
            timeout_secs: DEFAULT_DB_TIMEOUT_SECS,
            max_retained: None,
        }
    }
}

impl DbSettings {
    /// Base URL of the HTTP API.
    pub fn http_base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.tcp_port)
    }

    /// `host:port` of the UDP listener.
    pub fn udp_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Effective retry buffer bound.
    pub fn max_retained(&self) -> usize {
        self.max_retained
            .unwrap_or_else(|| self.full_size.saturating_mul(RETAIN_FACTOR))
            .max(self.full_size)
    }

    /// Username/password pair, only when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

/// `geo.*` settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    /// Geohash length in characters (1-12)
    pub precision: usize,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            precision: DEFAULT_GEOHASH_PRECISION,
        }
    }
}

/// `source.*` settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Poll interval in milliseconds while the file is idle; read errors use
    /// a fixed backoff instead
    pub poll_interval_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// All settings recognised in the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db: DbSettings,
    pub geo: GeoSettings,
    pub source: SourceSettings,
}

impl Settings {
    /// Loads settings from `path` (required) or from `./config.*` (optional),
    /// then applies `GEOSTAT_*` environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if the file is missing (when explicitly
    /// given) or malformed, and `ConfigError::Invalid` if a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = ::config::Config::builder();
        let builder = match path {
            Some(p) => builder.add_source(File::from(p).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db.full_size == 0 {
            return Err(ConfigError::Invalid {
                key: "db.full_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.db.database.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db.database",
                reason: "must not be empty".to_string(),
            });
        }
        if self.db.measurement.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db.measurement",
                reason: "must not be empty".to_string(),
            });
        }
        if self.db.retention_policy.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db.retention_policy.name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.db.retention_policy.value.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db.retention_policy.value",
                reason: "must not be empty".to_string(),
            });
        }
        if self.geo.precision == 0 || self.geo.precision > MAX_GEOHASH_PRECISION {
            return Err(ConfigError::Invalid {
                key: "geo.precision",
                reason: format!("must be between 1 and {}", MAX_GEOHASH_PRECISION),
            });
        }
        if self.source.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "source.poll_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
