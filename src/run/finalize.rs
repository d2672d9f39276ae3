//! Pipeline finalization and cleanup.
//!
//! This module contains the `finalize_pipeline` function which handles
//! cleanup and report aggregation after the main loop stops.

use tokio_util::sync::CancellationToken;

use crate::app::{log_progress, print_drop_statistics, shutdown_gracefully};
use crate::error_handling::DropReason;

use super::resources::{Pipeline, PipelineReport, PipelineState};

/// Finalize a run and produce the report.
///
/// 1. Discard (and count) points still buffered
/// 2. Stop the line source and the progress logger
/// 3. Log final progress and drop statistics
pub async fn finalize_pipeline<R, W>(
    mut pipeline: Pipeline<R, W>,
    cancel: CancellationToken,
    logging_task: Option<tokio::task::JoinHandle<()>>,
) -> PipelineReport {
    pipeline.transition(PipelineState::Terminated);

    let pending = pipeline.batcher.take();
    if !pending.is_empty() {
        log::warn!("Discarding {} buffered points at shutdown", pending.len());
        pipeline
            .stats
            .add_drops(DropReason::Shutdown, pending.len());
    }

    pipeline.source.close().await;
    shutdown_gracefully(cancel, logging_task).await;

    log_progress(pipeline.start_time, &pipeline.stats);
    print_drop_statistics(&pipeline.stats);

    PipelineReport::from_stats(
        &pipeline.stats,
        pipeline.start_time.elapsed().as_secs_f64(),
    )
}
