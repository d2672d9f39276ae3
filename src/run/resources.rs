//! Pipeline resources and state.
//!
//! This module defines the `Pipeline` struct which holds everything the driver
//! owns while running, plus the state and report types.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use strum::IntoEnumIterator;

use crate::error_handling::{DropReason, ProcessingStats};
use crate::source::LineSource;
use crate::storage::{BatchConfig, PointBatcher};

/// Lifecycle of the pipeline driver.
///
/// `Starting -> Running -> (TransientError <-> Running) -> Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Building the writer, opening the GeoIP database and the log file
    Starting,
    /// Processing lines
    Running,
    /// The last read or write failed; processing continues
    TransientError,
    /// Stopped by cancellation or a fatal error
    Terminated,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Starting => "STARTING",
            PipelineState::Running => "RUNNING",
            PipelineState::TransientError => "TRANSIENT_ERROR",
            PipelineState::Terminated => "TERMINATED",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the driver owns while running.
///
/// The batch, the writer and its schema flag are only touched from the driver
/// task, so none of them needs locking. `stats` is shared with the progress
/// logger.
pub struct Pipeline<R, W> {
    /// Lines of the followed file
    pub source: LineSource,
    /// GeoIP resolver
    pub resolver: R,
    /// Store writer
    pub writer: W,
    /// Points waiting to be written
    pub batcher: PointBatcher,
    /// Counters shared with the progress logger
    pub stats: Arc<ProcessingStats>,
    /// Current lifecycle state
    pub state: PipelineState,
    /// When the pipeline was built
    pub start_time: Instant,
}

impl<R, W> Pipeline<R, W> {
    /// Assembles a pipeline from already opened parts.
    pub fn new(source: LineSource, resolver: R, writer: W, batch: BatchConfig) -> Self {
        Pipeline {
            source,
            resolver,
            writer,
            batcher: PointBatcher::new(batch),
            stats: Arc::new(ProcessingStats::new()),
            state: PipelineState::Starting,
            start_time: Instant::now(),
        }
    }

    /// Moves to `next`, logging the transition.
    pub(crate) fn transition(&mut self, next: PipelineState) {
        if self.state == next {
            return;
        }
        match next {
            PipelineState::TransientError => {
                log::debug!("Pipeline state {} -> {}", self.state, next)
            }
            _ => log::info!("Pipeline state {} -> {}", self.state, next),
        }
        self.state = next;
    }
}

/// Summary of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Lines delivered by the line source
    pub lines_read: usize,
    /// Points accepted by the store writer
    pub points_written: usize,
    /// Dropped lines and points by reason (zero counts omitted)
    pub drops: HashMap<DropReason, usize>,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

impl PipelineReport {
    pub(crate) fn from_stats(stats: &ProcessingStats, elapsed_seconds: f64) -> Self {
        let drops = DropReason::iter()
            .map(|reason| (reason, stats.get_drop_count(reason)))
            .filter(|(_, count)| *count > 0)
            .collect();
        PipelineReport {
            lines_read: stats.lines_read(),
            points_written: stats.points_written(),
            drops,
            elapsed_seconds,
        }
    }

    /// Count for one drop reason.
    pub fn dropped(&self, reason: DropReason) -> usize {
        self.drops.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> usize {
        self.drops.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(PipelineState::Starting.to_string(), "STARTING");
        assert_eq!(PipelineState::TransientError.to_string(), "TRANSIENT_ERROR");
    }

    #[test]
    fn test_report_from_stats() {
        let stats = ProcessingStats::new();
        stats.record_line();
        stats.record_line();
        stats.record_written(1);
        stats.increment_drop(DropReason::NonPublicAddress);

        let report = PipelineReport::from_stats(&stats, 1.5);
        assert_eq!(report.lines_read, 2);
        assert_eq!(report.points_written, 1);
        assert_eq!(report.dropped(DropReason::NonPublicAddress), 1);
        assert_eq!(report.dropped(DropReason::LookupMiss), 0);
        assert_eq!(report.drops.len(), 1);
        assert_eq!(report.total_dropped(), 1);
    }
}
