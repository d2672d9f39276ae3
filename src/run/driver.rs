//! The main pipeline loop.

use std::time::Instant;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::{MAX_FLUSH_TICK, MIN_FLUSH_TICK};
use crate::error_handling::DropReason;
use crate::extract::{extract_ipv4, parse_public_ipv4};
use crate::geoip::Resolver;
use crate::storage::PointWriter;

use super::resources::{Pipeline, PipelineState};

impl<R: Resolver, W: PointWriter> Pipeline<R, W> {
    /// Processes lines until `cancel` fires or a fatal error occurs.
    ///
    /// Each line goes through extraction, classification and lookup; resolved
    /// points are batched and written when the batch is full or the flush
    /// interval has passed. A timer re-checks the interval while the file is
    /// idle.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions (schema provisioning).
    /// Read, lookup and write failures are logged and counted.
    pub(crate) async fn drive(&mut self, cancel: &CancellationToken) -> Result<()> {
        let tick_period = self
            .batcher
            .config()
            .flush_interval
            .clamp(MIN_FLUSH_TICK, MAX_FLUSH_TICK);
        let mut flush_timer = tokio::time::interval(tick_period);
        flush_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.transition(PipelineState::Running);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::info!("Cancellation requested; stopping pipeline");
                    return Ok(());
                }
                _ = flush_timer.tick() => {
                    self.flush_if_due().await?;
                }
                line = self.source.next_line() => match line {
                    Some(Ok(line)) => {
                        self.handle_line(&line);
                        self.flush_if_due().await?;
                    }
                    Some(Err(e)) => {
                        log::warn!("{}; retrying", e);
                        self.stats.increment_drop(DropReason::ReadError);
                        self.transition(PipelineState::TransientError);
                    }
                    // The source only ends once cancelled
                    None => return Ok(()),
                },
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        self.stats.record_line();
        if self.state == PipelineState::TransientError {
            self.transition(PipelineState::Running);
        }

        let Some(text) = extract_ipv4(line) else {
            self.stats.increment_drop(DropReason::NoAddress);
            return;
        };
        let ip = match parse_public_ipv4(text) {
            Ok(Some(ip)) => ip,
            Ok(None) => {
                self.stats.increment_drop(DropReason::NonPublicAddress);
                return;
            }
            Err(e) => {
                log::debug!("Skipping malformed address {}: {}", text, e);
                self.stats.increment_drop(DropReason::MalformedAddress);
                return;
            }
        };

        match self.resolver.resolve(ip) {
            Ok(point) => {
                if let Some(evicted) = self.batcher.append(point) {
                    log::debug!("Retry buffer full; discarded point for {}", evicted.ip);
                    self.stats.increment_drop(DropReason::RetainOverflow);
                }
                log::trace!("Buffered point for {} ({} pending)", ip, self.batcher.len());
            }
            Err(e) => {
                log::warn!("{}", e);
                self.stats.increment_drop(DropReason::from(&e));
            }
        }
    }

    /// Writes the batch if a flush trigger fired.
    ///
    /// A failed write puts the batch back and holds further attempts off for
    /// one retry delay. Schema errors are returned.
    async fn flush_if_due(&mut self) -> Result<()> {
        if !self.batcher.is_due(Instant::now()) {
            return Ok(());
        }

        let batch = self.batcher.take();
        match self.writer.write(&batch).await {
            Ok(()) => {
                self.batcher.mark_flushed(Instant::now());
                self.stats.record_written(batch.len());
                log::debug!("Flushed {} points", batch.len());
                if self.state == PipelineState::TransientError {
                    self.transition(PipelineState::Running);
                }
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                self.batcher.restore(batch, Instant::now());
                Err(anyhow::Error::new(e).context("Failed to provision InfluxDB database"))
            }
            Err(e) => {
                let retry_in = self.batcher.config().retry_delay();
                log::warn!(
                    "Failed to write {} points: {}; retrying in {:?}",
                    batch.len(),
                    e,
                    retry_in
                );
                let discarded = self.batcher.restore(batch, Instant::now());
                self.stats.add_drops(DropReason::RetainOverflow, discarded);
                self.transition(PipelineState::TransientError);
                Ok(())
            }
        }
    }
}
