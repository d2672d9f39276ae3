//! GeoIP data structures.
//!
//! This module defines the enriched record produced for every qualifying log
//! line and the database metadata logged at startup.

use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;

/// Metadata about the loaded GeoIP database
#[derive(Debug, Clone)]
pub struct GeoIpMetadata {
    /// Source path
    pub source: String,
    /// Database build version (`build_<epoch>`)
    pub version: String,
    /// Database type, e.g. `GeoLite2-City`
    pub database_type: String,
}

/// Location fields read from a City database entry.
///
/// Kept separate from the database record type so point derivation can be
/// exercised without an `.mmdb` file.
#[derive(Debug, Clone, Default)]
pub struct CityFields {
    /// English city name
    pub city_name: Option<String>,
    /// English country name
    pub country_name: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One enriched log hit, ready to become a time-series point.
///
/// `ip` is always a public IPv4 address and `city` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub geohash: String,
    pub host: String,
    pub ip: Ipv4Addr,
    pub country_code: String,
    pub city: String,
    pub observed_at: DateTime<Utc>,
}
