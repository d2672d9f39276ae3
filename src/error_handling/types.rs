//! Error type definitions.
//!
//! This module defines all error types and drop reasons used throughout the pipeline.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error binding the UDP socket used for fire-and-forget writes.
    #[error("UDP socket initialization error: {0}")]
    UdpSocketError(#[source] std::io::Error),

    /// Error opening the GeoIP database.
    #[error("GeoIP database initialization error: {0}")]
    GeoIpError(String),
}

/// Error types for configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A configuration value is outside its accepted range.
    #[error("Invalid configuration value for `{key}`: {reason}")]
    Invalid {
        /// Dotted configuration key, e.g. `db.full_size`
        key: &'static str,
        /// Human-readable explanation
        reason: String,
    },
}

/// Errors signalled by the line source.
///
/// These never terminate the line stream; they are delivered in-band so the
/// driver can log them and keep going.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Opening (or reopening) the followed file failed.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Followed path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading from an open handle failed.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Followed path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced while resolving an address to a geo point.
#[derive(Error, Debug)]
pub enum LookupError {
    /// The address has no entry in the GeoIP database.
    #[error("No GeoIP entry for {0}")]
    NotFound(String),

    /// The database entry could not be decoded.
    #[error("Failed to decode GeoIP entry for {ip}: {reason}")]
    Decode {
        /// Looked up address
        ip: String,
        /// Decoder error message
        reason: String,
    },

    /// The entry has neither a city nor a country name.
    #[error("GeoIP entry for {0} has no city or country name")]
    MissingLocationName(String),

    /// Coordinates could not be geohashed (out of range).
    #[error("Failed to geohash coordinates for {ip}: {reason}")]
    Geohash {
        /// Looked up address
        ip: String,
        /// Encoder error message
        reason: String,
    },

    /// The local hostname could not be determined.
    #[error("Failed to resolve local hostname: {0}")]
    Hostname(String),
}

/// Errors produced while writing a batch to the store.
///
/// Only `Schema` is fatal; for the others the caller retains the batch.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Local socket error on the UDP transport.
    #[error("UDP send failed: {0}")]
    Udp(#[from] std::io::Error),

    /// The HTTP request itself failed (connect, timeout, body).
    #[error("HTTP write request failed: {0}")]
    Http(#[from] ReqwestError),

    /// The store answered with a non-success status.
    #[error("Store rejected write with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Lazy schema provisioning failed before the write.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl WriteError {
    /// Whether this failure must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WriteError::Schema(_))
    }
}

/// Errors creating the target database or retention policy.
///
/// Always fatal.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The provisioning request could not be sent.
    #[error("Schema request `{statement}` failed: {source}")]
    Request {
        /// InfluxQL statement
        statement: String,
        /// Underlying HTTP error
        #[source]
        source: ReqwestError,
    },

    /// The store refused the provisioning statement.
    #[error("Schema statement `{statement}` rejected ({status}): {body}")]
    Rejected {
        /// InfluxQL statement
        statement: String,
        /// HTTP status code
        status: u16,
        /// Response body or embedded error message
        body: String,
    },
}

/// Reasons a log line does not end up as a written point.
///
/// Used for statistics only; the emitted metric stream has no error series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum DropReason {
    /// The line contains no dotted quad
    NoAddress,
    /// The address is private, loopback or link-local
    NonPublicAddress,
    /// The dotted quad has out-of-range octets
    MalformedAddress,
    /// The address is not in the GeoIP database (or its entry is unusable)
    LookupMiss,
    /// The local hostname could not be resolved
    HostnameFailure,
    /// The line source reported a read error
    ReadError,
    /// Retained points discarded because the retry buffer overflowed
    RetainOverflow,
    /// Buffered points discarded at shutdown
    Shutdown,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NoAddress => "No address in line",
            DropReason::NonPublicAddress => "Non-public address",
            DropReason::MalformedAddress => "Malformed address",
            DropReason::LookupMiss => "GeoIP lookup miss",
            DropReason::HostnameFailure => "Hostname resolution failure",
            DropReason::ReadError => "Log read error",
            DropReason::RetainOverflow => "Retry buffer overflow",
            DropReason::Shutdown => "Dropped at shutdown",
        }
    }
}

impl From<&LookupError> for DropReason {
    fn from(e: &LookupError) -> Self {
        match e {
            LookupError::Hostname(_) => DropReason::HostnameFailure,
            _ => DropReason::LookupMiss,
        }
    }
}
