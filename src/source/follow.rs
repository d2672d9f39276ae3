//! Polling file follower.
//!
//! Keeps one open handle on the followed file and reads whatever was appended
//! since the last poll. At EOF it compares the path's current identity with the
//! open handle to notice rotation (new inode) and truncation (shorter file).

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::config::MAX_READ_CHUNK_BYTES;
use crate::error_handling::SourceError;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Identity of a file independent of its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[cfg(unix)]
    fn from_metadata(meta: &std::fs::Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(FileId {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    // Without inode numbers only truncation can be detected.
    #[cfg(not(unix))]
    fn from_metadata(_meta: &std::fs::Metadata) -> Option<Self> {
        None
    }
}

/// Follows one path across appends, truncation and rotation.
pub struct Follower {
    path: PathBuf,
    file: Option<File>,
    identity: Option<FileId>,
    /// Bytes consumed from the current file
    offset: u64,
    /// Bytes of an unterminated trailing line
    pending: Vec<u8>,
}

impl Follower {
    fn new(path: &Path) -> Self {
        Follower {
            path: path.to_path_buf(),
            file: None,
            identity: None,
            offset: 0,
            pending: Vec::new(),
        }
    }

    /// Opens `path` positioned at its current end so existing content is not replayed.
    ///
    /// A missing file is not an error: it is waited for and read from the
    /// beginning once created.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Open` if the path exists but cannot be opened, or
    /// is a directory.
    pub async fn start_at_end(path: &Path) -> Result<Self, SourceError> {
        let mut follower = Follower::new(path);
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("{} does not exist yet; waiting for it", path.display());
                return Ok(follower);
            }
            Err(e) => return Err(follower.open_error(e)),
        };

        let meta = file.metadata().await.map_err(|e| follower.open_error(e))?;
        if meta.is_dir() {
            return Err(follower.open_error(std::io::Error::other("path is a directory")));
        }
        follower.offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| follower.read_error(e))?;
        follower.identity = FileId::from_metadata(&meta);
        follower.file = Some(file);
        log::debug!(
            "Following {} from offset {}",
            path.display(),
            follower.offset
        );
        Ok(follower)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads newly appended data and returns the completed lines.
    ///
    /// An empty result means nothing new was available. On error the handle is
    /// dropped; the next poll reopens the file and resumes at the same offset
    /// if it is still the same file.
    pub async fn poll(&mut self) -> Result<Vec<String>, SourceError> {
        if self.file.is_none() && !self.reopen().await? {
            return Ok(Vec::new());
        }

        let read = self.read_available().await?;
        let mut lines = self.drain_lines();
        if read == 0 {
            self.check_rotation(&mut lines).await?;
        }
        Ok(lines)
    }

    async fn reopen(&mut self) -> Result<bool, SourceError> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(self.open_error(e)),
        };
        let meta = file.metadata().await.map_err(|e| self.open_error(e))?;
        let identity = FileId::from_metadata(&meta);

        if identity.is_some() && identity == self.identity && meta.len() >= self.offset {
            file.seek(SeekFrom::Start(self.offset))
                .await
                .map_err(|e| self.read_error(e))?;
            log::debug!(
                "Reopened {} at offset {}",
                self.path.display(),
                self.offset
            );
        } else {
            self.offset = 0;
            self.pending.clear();
            log::info!("Opened {} from the beginning", self.path.display());
        }

        self.identity = identity;
        self.file = Some(file);
        Ok(true)
    }

    async fn read_available(&mut self) -> Result<usize, SourceError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };

        let mut buf = vec![0u8; READ_BUFFER_BYTES];
        let mut total = 0usize;
        while total < MAX_READ_CHUNK_BYTES {
            let n = match file.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    self.file = None;
                    return Err(self.read_error(e));
                }
            };
            if n == 0 {
                break;
            }
            self.pending.extend_from_slice(&buf[..n]);
            self.offset += n as u64;
            total += n;
        }
        Ok(total)
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        // `complete` ends with a newline; drop it so split yields no trailing empty line.
        complete[..complete.len() - 1]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect()
    }

    async fn check_rotation(&mut self, lines: &mut Vec<String>) -> Result<(), SourceError> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            // Moved away and not recreated yet; keep draining the old handle.
            Err(_) => return Ok(()),
        };

        let identity = FileId::from_metadata(&meta);
        if identity.is_some() && identity != self.identity {
            log::info!("{} was rotated; reopening", self.path.display());
            if !self.pending.is_empty() {
                let tail = std::mem::take(&mut self.pending);
                lines.push(decode_line(&tail));
            }
            self.file = None;
            self.identity = None;
            self.offset = 0;
            return Ok(());
        }

        if meta.len() < self.offset {
            log::warn!(
                "{} was truncated ({} < {}); reading from the beginning",
                self.path.display(),
                meta.len(),
                self.offset
            );
            self.offset = 0;
            self.pending.clear();
            if let Some(file) = self.file.as_mut() {
                if let Err(e) = file.seek(SeekFrom::Start(0)).await {
                    self.file = None;
                    return Err(self.read_error(e));
                }
            }
        }
        Ok(())
    }

    fn open_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Open {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Read {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Strips a trailing `\r` and decodes lossily.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
