//! Line source: follows a growing log file.
//!
//! A background task polls the file and feeds an unbounded channel; the
//! pipeline driver consumes it with [`LineSource::next_line`]. The stream only
//! ends when the source is cancelled. Read errors are delivered in-band as
//! `Err` items and followed by a fixed backoff before the file is reopened.

mod follow;

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::READ_ERROR_BACKOFF;
use crate::error_handling::SourceError;

pub use follow::Follower;

/// One line of the followed file, or a read error signal.
pub type RawLine = Result<String, SourceError>;

/// Handle on the background follower task.
pub struct LineSource {
    rx: mpsc::UnboundedReceiver<RawLine>,
    task: JoinHandle<()>,
}

impl LineSource {
    /// Starts following `path` from its current end.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Open` if the path exists but cannot be followed.
    pub async fn open(
        path: &Path,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, SourceError> {
        let follower = Follower::start_at_end(path).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(follow_file(follower, tx, poll_interval, cancel));
        Ok(LineSource { rx, task })
    }

    /// Waits for the next line. Returns `None` once the follower has stopped.
    pub async fn next_line(&mut self) -> Option<RawLine> {
        self.rx.recv().await
    }

    /// Stops the follower task and waits for it to exit.
    pub async fn close(self) {
        drop(self.rx);
        self.task.abort();
        let _ = self.task.await;
    }
}

async fn follow_file(
    mut follower: Follower,
    tx: mpsc::UnboundedSender<RawLine>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    log::debug!("Line source started for {}", follower.path().display());
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let delay = match follower.poll().await {
            Ok(lines) if lines.is_empty() => poll_interval,
            Ok(lines) => {
                for line in lines {
                    if tx.send(Ok(line)).is_err() {
                        return;
                    }
                }
                // More may be waiting; poll again right away.
                continue;
            }
            Err(e) => {
                if tx.send(Err(e)).is_err() {
                    return;
                }
                READ_ERROR_BACKOFF
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    log::debug!("Line source stopped for {}", follower.path().display());
}
