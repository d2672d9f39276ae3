//! Pipeline resource initialization.
//!
//! This module contains the `init_pipeline` function which opens everything
//! the driver needs before the main loop begins. Any failure here is fatal.

use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::geoip::GeoResolver;
use crate::source::LineSource;
use crate::storage::{BatchConfig, StoreWriter};

use super::resources::Pipeline;

/// Initialize all resources needed for a run.
///
/// Steps, in order:
/// 1. Build the store writer for the configured transport
/// 2. Open the GeoIP database
/// 3. Start following the log file
///
/// # Errors
///
/// Returns an error with context if any step fails.
pub async fn init_pipeline(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Pipeline<GeoResolver, StoreWriter>> {
    let db = &config.settings.db;
    info!(
        "Batching up to {} points or {}s per write",
        db.full_size, db.insert_time_interval
    );

    let writer = StoreWriter::connect(db)
        .await
        .context("Failed to initialize InfluxDB writer")?;

    let resolver = GeoResolver::open(&config.geo_db, config.settings.geo.precision)
        .await
        .with_context(|| format!("Failed to open GeoIP database {}", config.geo_db.display()))?;

    let source = LineSource::open(&config.log_file, config.poll_interval(), cancel.child_token())
        .await
        .with_context(|| format!("Failed to follow {}", config.log_file.display()))?;
    info!("Following {}", config.log_file.display());

    Ok(Pipeline::new(
        source,
        resolver,
        writer,
        BatchConfig::from_db(db),
    ))
}
