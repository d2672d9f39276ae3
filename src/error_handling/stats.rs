//! Processing statistics tracking.
//!
//! This module provides thread-safe counters for lines read, points written and
//! records dropped, shared between the driver and the progress logger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::DropReason;

/// Thread-safe processing statistics tracker.
///
/// All drop reasons are initialized to zero on creation. Shared across tasks
/// using `Arc`.
pub struct ProcessingStats {
    lines_read: AtomicUsize,
    points_written: AtomicUsize,
    drops: HashMap<DropReason, AtomicUsize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut drops = HashMap::new();
        for reason in DropReason::iter() {
            drops.insert(reason, AtomicUsize::new(0));
        }

        ProcessingStats {
            lines_read: AtomicUsize::new(0),
            points_written: AtomicUsize::new(0),
            drops,
        }
    }

    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self, count: usize) {
        self.points_written.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment a drop counter by one.
    pub fn increment_drop(&self, reason: DropReason) {
        self.add_drops(reason, 1);
    }

    /// Increment a drop counter by `count`.
    pub fn add_drops(&self, reason: DropReason, count: usize) {
        if let Some(counter) = self.drops.get(&reason) {
            counter.fetch_add(count, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment drop counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                reason
            );
        }
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read.load(Ordering::SeqCst)
    }

    pub fn points_written(&self) -> usize {
        self.points_written.load(Ordering::SeqCst)
    }

    /// Get the count for a drop reason.
    pub fn get_drop_count(&self, reason: DropReason) -> usize {
        self.drops
            .get(&reason)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Get total drop count across all reasons.
    pub fn total_drops(&self) -> usize {
        DropReason::iter().map(|r| self.get_drop_count(r)).sum()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
