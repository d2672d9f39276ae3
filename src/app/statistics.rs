//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{DropReason, ProcessingStats};

/// Prints drop counts per reason to the log.
pub fn print_drop_statistics(stats: &ProcessingStats) {
    let total = stats.total_drops();
    if total == 0 {
        return;
    }

    info!("Drop Counts ({} total):", total);
    for reason in DropReason::iter() {
        let count = stats.get_drop_count(reason);
        if count > 0 {
            info!("   {}: {}", reason.as_str(), count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_drop_statistics_no_drops() {
        let stats = ProcessingStats::new();
        // Should not panic when there are no drops
        print_drop_statistics(&stats);
    }

    #[test]
    fn test_print_drop_statistics_with_drops() {
        let stats = ProcessingStats::new();
        stats.increment_drop(DropReason::LookupMiss);
        stats.add_drops(DropReason::Shutdown, 7);
        print_drop_statistics(&stats);
        assert_eq!(stats.total_drops(), 8);
    }
}
