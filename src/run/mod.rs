//! Pipeline driver.
//!
//! Wires the line source, address extraction, GeoIP resolution, batching and
//! the store writer into one loop. Startup failures and schema provisioning
//! failures are fatal; everything else is logged, counted and skipped.

mod driver;
mod finalize;
mod init;
mod resources;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::app::spawn_progress_logger;
use crate::config::{Config, PROGRESS_LOG_INTERVAL};
use crate::geoip::Resolver;
use crate::storage::PointWriter;

pub use finalize::finalize_pipeline;
pub use init::init_pipeline;
pub use resources::{Pipeline, PipelineReport, PipelineState};

/// Runs the pipeline described by `config` until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the store writer, GeoIP database or log file cannot be
/// opened, or if provisioning the database fails.
///
/// # Example
///
/// ```no_run
/// use geostat::{run_pipeline, Config};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let report = run_pipeline(Config::default(), CancellationToken::new()).await?;
/// println!("Wrote {} points", report.points_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(config: Config, cancel: CancellationToken) -> Result<PipelineReport> {
    log::info!("Pipeline state {}", PipelineState::Starting);
    let pipeline = init_pipeline(&config, &cancel).await?;
    pipeline.run(cancel).await
}

impl<R: Resolver, W: PointWriter> Pipeline<R, W> {
    /// Drives the pipeline until `cancel` fires, then finalizes it.
    ///
    /// Buffered points are discarded on shutdown and counted in the report.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that stopped the loop, after cleanup.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<PipelineReport> {
        let logging_cancel = cancel.child_token();
        let logging_task = spawn_progress_logger(
            self.start_time,
            self.stats.clone(),
            PROGRESS_LOG_INTERVAL,
            logging_cancel.clone(),
        );

        let outcome = self.drive(&cancel).await;
        let report = finalize_pipeline(self, logging_cancel, Some(logging_task)).await;
        outcome.map(|()| report)
    }
}
