//! Asynchronous by-name file following.
//!
//! Emits every complete line appended to the target file after attach. The
//! file is tracked by name, not by handle: truncation or replacement
//! (logrotate style) is detected and the new file is picked up from its
//! start, so lines keep flowing across rotation.

use std::io::SeekFrom;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const CHANNEL_CAPACITY: usize = 1024;
const READ_CHUNK: usize = 8192;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("cannot follow {path}: {source}")]
    Attach {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FollowError {
    fn attach(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Attach {
            path: path.into(),
            source,
        }
    }
}

/// Receiving side of a follower task. When [`LineFollower::next_line`]
/// returns `None`, the underlying monitoring task has stopped for good and
/// the source must be considered dead.
pub struct LineFollower {
    rx: mpsc::Receiver<String>,
}

impl LineFollower {
    /// Attaches to `path` and starts emitting lines appended from this point
    /// on; content already in the file is skipped. Attaching to a missing
    /// file is an error.
    pub async fn attach(path: impl Into<PathBuf>) -> Result<Self, FollowError> {
        let path = path.into();
        let mut file = File::open(&path)
            .await
            .map_err(|e| FollowError::attach(&path, e))?;
        let ino = file
            .metadata()
            .await
            .map_err(|e| FollowError::attach(&path, e))?
            .ino();
        let offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| FollowError::attach(&path, e))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(follow_loop(path, file, ino, offset, tx));

        Ok(Self { rx })
    }

    /// Adapts an already-running line producer, for callers that are not
    /// tailing a file (tests, pipes).
    pub fn from_receiver(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    /// Next appended line without its trailing newline, or `None` once the
    /// follower has terminated.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

async fn follow_loop(
    path: PathBuf,
    mut file: File,
    mut ino: u64,
    mut offset: u64,
    tx: mpsc::Sender<String>,
) {
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        match file.read(&mut buf).await {
            Ok(0) => {
                // Caught up. Check for rotation or truncation before waiting.
                match tokio::fs::metadata(&path).await {
                    Ok(meta) if meta.ino() != ino || meta.len() < offset => {
                        match File::open(&path).await {
                            Ok(reopened) => {
                                tracing::info!(path = %path.display(), "log rotated; following new file");
                                file = reopened;
                                ino = meta.ino();
                                offset = 0;
                                pending.clear();
                                continue;
                            }
                            // Mid-rotation window; retry on the next poll.
                            Err(_) => {}
                        }
                    }
                    Ok(_) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        // File may reappear under the same name; keep polling.
                    }
                    Err(err) => {
                        tracing::error!(error = %err, path = %path.display(), "follower stopped");
                        return;
                    }
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Ok(n) => {
                offset += n as u64;
                pending.extend_from_slice(&buf[..n]);
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let raw: Vec<u8> = pending.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned();
                    if tx.send(line).await.is_err() {
                        // Receiver gone; nobody is watching anymore.
                        return;
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "follower stopped");
                return;
            }
        }
    }
}
