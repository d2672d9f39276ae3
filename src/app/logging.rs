//! Progress logging utilities.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use tokio_util::sync::CancellationToken;

use crate::error_handling::ProcessingStats;

/// Logs progress information about line processing.
///
/// # Arguments
///
/// * `start_time` - The start time of processing
/// * `stats` - Shared processing counters
pub fn log_progress(start_time: Instant, stats: &ProcessingStats) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let lines = stats.lines_read();
    let rate = if elapsed_secs > 0.0 {
        lines as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Processed {} lines in {:.2} seconds (~{:.2} lines/sec), {} points written, {} dropped",
        lines,
        elapsed_secs,
        rate,
        stats.points_written(),
        stats.total_drops()
    );
}

/// Spawns a task that calls [`log_progress`] every `every` until cancelled.
pub fn spawn_progress_logger(
    start_time: Instant,
    stats: Arc<ProcessingStats>,
    every: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => log_progress(start_time, &stats),
            }
        }
    })
}
