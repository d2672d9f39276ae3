// storage/batch.rs
// Point buffering with size and time flush triggers

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::{DbSettings, MAX_RETRY_DELAY, MIN_RETRY_DELAY};
use crate::geoip::GeoPoint;

/// Configuration for batch flushing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Flush once this many points are buffered
    pub full_size: usize,
    /// Flush once this much time passed since the last successful flush
    pub flush_interval: Duration,
    /// Upper bound on buffered points while writes are failing
    pub max_retained: usize,
}

impl BatchConfig {
    pub fn from_db(db: &DbSettings) -> Self {
        BatchConfig {
            full_size: db.full_size.max(1),
            flush_interval: Duration::from_secs(db.insert_time_interval),
            max_retained: db.max_retained(),
        }
    }

    /// How long a failed batch waits before the next attempt.
    pub fn retry_delay(&self) -> Duration {
        self.flush_interval.clamp(MIN_RETRY_DELAY, MAX_RETRY_DELAY)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig::from_db(&DbSettings::default())
    }
}

/// Returns true when a batch of `len` points is due for writing.
pub fn should_flush(len: usize, last_flush: Instant, now: Instant, config: &BatchConfig) -> bool {
    len >= config.full_size || now.saturating_duration_since(last_flush) >= config.flush_interval
}

/// Buffer of points waiting to be written
pub struct PointBatcher {
    config: BatchConfig,
    buffer: VecDeque<GeoPoint>,
    last_flush: Instant,
    /// Set by a failed write; no attempt is made before this instant
    retry_after: Option<Instant>,
}

impl PointBatcher {
    pub fn new(config: BatchConfig) -> Self {
        PointBatcher {
            buffer: VecDeque::with_capacity(config.full_size),
            config,
            last_flush: Instant::now(),
            retry_after: None,
        }
    }

    /// Adds a point.
    ///
    /// While writes are failing the buffer can outgrow `full_size`; past
    /// `max_retained` the oldest point is evicted and returned.
    pub fn append(&mut self, point: GeoPoint) -> Option<GeoPoint> {
        self.buffer.push_back(point);
        if self.buffer.len() > self.config.max_retained {
            self.buffer.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }

    /// Checks whether the buffered points should be written at `now`.
    ///
    /// An empty batch is never due, and neither is one waiting out the retry
    /// delay of a failed write.
    pub fn is_due(&self, now: Instant) -> bool {
        if self.buffer.is_empty() {
            return false;
        }
        if self.retry_after.is_some_and(|at| now < at) {
            return false;
        }
        should_flush(self.buffer.len(), self.last_flush, now, &self.config)
    }

    /// Swaps in an empty batch and returns the buffered points
    pub fn take(&mut self) -> Vec<GeoPoint> {
        let taken = std::mem::replace(
            &mut self.buffer,
            VecDeque::with_capacity(self.config.full_size),
        );
        Vec::from(taken)
    }

    /// Records a successful write at `now`
    pub fn mark_flushed(&mut self, now: Instant) {
        self.last_flush = now;
        self.retry_after = None;
    }

    /// Puts back a batch whose write failed at `now`, ahead of any newer points.
    ///
    /// The next attempt waits for [`BatchConfig::retry_delay`]; `last_flush`
    /// is left untouched so the batch is due as soon as that delay passes.
    /// Returns how many of the oldest points were discarded to stay within
    /// `max_retained`.
    pub fn restore(&mut self, failed: Vec<GeoPoint>, now: Instant) -> usize {
        let mut merged = VecDeque::from(failed);
        merged.append(&mut self.buffer);
        let overflow = merged.len().saturating_sub(self.config.max_retained);
        if overflow > 0 {
            merged.drain(..overflow);
            log::warn!(
                "Retry buffer full; discarded {} oldest points (keeping {})",
                overflow,
                merged.len()
            );
        }
        self.buffer = merged;
        self.retry_after = Some(now + self.config.retry_delay());
        overflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::net::Ipv4Addr;

    fn point(n: u8) -> GeoPoint {
        GeoPoint {
            geohash: "9q9hvumnuw3t".to_string(),
            host: "web-1".to_string(),
            ip: Ipv4Addr::new(8, 8, 8, n),
            country_code: "US".to_string(),
            city: "Mountain View".to_string(),
            observed_at: Utc::now(),
        }
    }

    fn config(full_size: usize, secs: u64, max_retained: usize) -> BatchConfig {
        BatchConfig {
            full_size,
            flush_interval: Duration::from_secs(secs),
            max_retained,
        }
    }

    #[test]
    fn test_should_flush_by_size_or_time() {
        let cfg = config(3, 10, 30);
        let start = Instant::now();

        assert!(!should_flush(2, start, start, &cfg));
        assert!(should_flush(3, start, start, &cfg));
        assert!(should_flush(1, start, start + Duration::from_secs(10), &cfg));
        assert!(!should_flush(1, start, start + Duration::from_secs(9), &cfg));
        // Clock going backwards never triggers a flush by time
        assert!(!should_flush(1, start + Duration::from_secs(5), start, &cfg));
    }

    #[test]
    fn test_from_db_settings() {
        let db = DbSettings {
            full_size: 5,
            insert_time_interval: 2,
            ..Default::default()
        };
        let cfg = BatchConfig::from_db(&db);
        assert_eq!(cfg.full_size, 5);
        assert_eq!(cfg.flush_interval, Duration::from_secs(2));
        assert_eq!(cfg.max_retained, 50);
    }

    #[test]
    fn test_full_size_triggers_exactly_at_threshold() {
        let mut batcher = PointBatcher::new(config(3, 3600, 30));
        let now = Instant::now();

        assert!(batcher.append(point(1)).is_none());
        assert!(!batcher.is_due(now));
        assert!(batcher.append(point(2)).is_none());
        assert!(!batcher.is_due(now));
        assert!(batcher.append(point(3)).is_none());
        assert_eq!(batcher.len(), 3);
        assert!(batcher.is_due(now));

        let taken = batcher.take();
        assert_eq!(taken.len(), 3);
        assert!(batcher.is_empty());
        assert!(!batcher.is_due(now));
    }

    #[test]
    fn test_empty_batch_is_never_due() {
        let batcher = PointBatcher::new(config(3, 0, 30));
        assert!(!batcher.is_due(Instant::now() + Duration::from_secs(60)));
    }

    #[test]
    fn test_mark_flushed_resets_timer() {
        let mut batcher = PointBatcher::new(config(100, 10, 1000));
        let later = batcher.last_flush() + Duration::from_secs(11);
        batcher.append(point(1));
        assert!(batcher.is_due(later));

        batcher.mark_flushed(later);
        assert!(!batcher.is_due(later + Duration::from_secs(1)));
    }

    #[test]
    fn test_restore_keeps_order_and_timer() {
        let mut batcher = PointBatcher::new(config(2, 10, 10));
        let before = batcher.last_flush();
        batcher.append(point(1));
        batcher.append(point(2));
        let failed = batcher.take();
        batcher.append(point(3));

        assert_eq!(batcher.restore(failed, Instant::now()), 0);
        let ips: Vec<u8> = batcher.take().iter().map(|p| p.ip.octets()[3]).collect();
        assert_eq!(ips, vec![1, 2, 3]);
        assert_eq!(batcher.last_flush(), before);
    }

    #[test]
    fn test_restore_drops_oldest_beyond_bound() {
        let mut batcher = PointBatcher::new(config(2, 10, 3));
        let failed: Vec<GeoPoint> = (1..=4).map(point).collect();
        batcher.append(point(5));

        assert_eq!(batcher.restore(failed, Instant::now()), 2);
        let ips: Vec<u8> = batcher.take().iter().map(|p| p.ip.octets()[3]).collect();
        assert_eq!(ips, vec![3, 4, 5]);
    }

    #[test]
    fn test_failed_batch_waits_for_retry_delay() {
        let mut batcher = PointBatcher::new(config(2, 5, 20));
        batcher.append(point(1));
        batcher.append(point(2));
        let failed_at = Instant::now();
        let failed = batcher.take();
        batcher.restore(failed, failed_at);

        // Full, but still inside the retry delay
        for n in 3..10 {
            batcher.append(point(n));
            assert!(!batcher.is_due(failed_at + Duration::from_millis(100)));
        }
        assert!(!batcher.is_due(failed_at + Duration::from_millis(4999)));
        assert!(batcher.is_due(failed_at + Duration::from_secs(5)));

        batcher.mark_flushed(failed_at + Duration::from_secs(5));
        assert!(batcher.retry_after.is_none());
    }

    #[test]
    fn test_retry_delay_is_bounded() {
        assert_eq!(config(1, 0, 10).retry_delay(), MIN_RETRY_DELAY);
        assert_eq!(config(1, 3600, 10).retry_delay(), MAX_RETRY_DELAY);
        assert_eq!(config(1, 10, 10).retry_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_append_evicts_oldest_beyond_bound() {
        let mut batcher = PointBatcher::new(config(2, 10, 3));
        for n in 1..=3 {
            assert!(batcher.append(point(n)).is_none());
        }
        let evicted = batcher.append(point(4)).expect("oldest point is evicted");
        assert_eq!(evicted.ip.octets()[3], 1);
        assert_eq!(batcher.len(), 3);
    }
}
