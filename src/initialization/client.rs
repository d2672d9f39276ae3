//! HTTP client initialization.
//!
//! This module builds the `reqwest` client shared by schema provisioning and
//! confirmed writes.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::DbSettings;

/// Initializes the HTTP client used to talk to InfluxDB.
///
/// Creates a `reqwest::Client` configured with:
/// - A bounded request timeout from `db.timeout_secs`, so a stalled store
///   cannot block ingestion indefinitely
/// - A `geostat/<version>` User-Agent
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(db: &DbSettings) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(db.timeout_secs))
        .connect_timeout(Duration::from_secs(db.timeout_secs))
        .user_agent(concat!("geostat/", env!("CARGO_PKG_VERSION")))
        .build()
}
