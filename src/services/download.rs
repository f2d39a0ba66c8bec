// src/services/download.rs

//! Download completion detection.
//!
//! Browser downloads expose no completion signal, so completion is
//! inferred from the download directory: a file that was not there when
//! the snapshot was taken appears, and its size stops changing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::time::{Instant, sleep};

use crate::error::{AppError, Result};
use crate::models::{DownloadEvent, TimeoutConfig, WorkflowConfig, ms};

/// Result of watching one candidate file.
enum Stability {
    Stable(u64),
    /// Removed or renamed while being watched
    Vanished,
    TimedOut,
}

/// Watches a download directory for new, stable files.
#[derive(Debug, Clone)]
pub struct DownloadDetector {
    dir: PathBuf,
    poll: Duration,
    stability_poll: Duration,
    ignored_suffixes: Vec<String>,
    ignored_names: Vec<String>,
}

impl DownloadDetector {
    /// Detector with a 1 s appearance poll and a 500 ms stability poll.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            poll: Duration::from_secs(1),
            stability_poll: Duration::from_millis(500),
            ignored_suffixes: vec![".crdownload".into(), ".part".into(), ".tmp".into()],
            ignored_names: Vec::new(),
        }
    }

    /// Detector configured from the run settings; the checkpoint file is ignored.
    pub fn from_config(
        dir: impl Into<PathBuf>,
        timeouts: &TimeoutConfig,
        workflow: &WorkflowConfig,
    ) -> Self {
        Self {
            dir: dir.into(),
            poll: ms(timeouts.download_poll_ms),
            stability_poll: ms(timeouts.stability_poll_ms),
            ignored_suffixes: workflow.ignored_download_suffixes.clone(),
            ignored_names: vec![workflow.checkpoint_file.clone()],
        }
    }

    pub fn with_polls(mut self, poll: Duration, stability_poll: Duration) -> Self {
        self.poll = poll;
        self.stability_poll = stability_poll;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record the files currently in the directory.
    pub async fn snapshot(&self) -> Result<DirectorySnapshot> {
        let files = self.list().await?.into_iter().map(|(path, _)| path).collect();
        Ok(DirectorySnapshot {
            detector: self.clone(),
            files,
        })
    }

    /// Snapshot now, then wait up to `timeout` for a new stable file.
    pub async fn await_new_stable_file(&self, timeout: Duration) -> Result<Option<DownloadEvent>> {
        self.snapshot().await?.await_new_stable_file(timeout).await
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored_names.iter().any(|n| n == name)
            || self
                .ignored_suffixes
                .iter()
                .any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// Regular, non-ignored files with their creation (or modification) time.
    ///
    /// A missing directory counts as empty.
    async fn list(&self) -> Result<Vec<(PathBuf, SystemTime)>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if self.is_ignored(&name.to_string_lossy()) {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((entry.path(), created));
        }
        Ok(files)
    }

    /// Poll the size of `path` until two consecutive readings match.
    async fn await_stable(&self, path: &Path, deadline: Instant) -> Result<Stability> {
        let Some(mut last) = file_size(path).await? else {
            return Ok(Stability::Vanished);
        };

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(Stability::TimedOut);
            }
            sleep(self.stability_poll.min(deadline - now)).await;

            let Some(size) = file_size(path).await? else {
                return Ok(Stability::Vanished);
            };
            if size == last {
                return Ok(Stability::Stable(size));
            }
            log::debug!("{} still growing ({} -> {} bytes)", path.display(), last, size);
            last = size;
        }
    }
}

async fn file_size(path: &Path) -> Result<Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// The file set of a download directory at one point in time.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    detector: DownloadDetector,
    files: HashSet<PathBuf>,
}

impl DirectorySnapshot {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Wait up to `timeout` for a file absent from this snapshot to appear
    /// and stop growing.
    ///
    /// When several new files appear the newest one is watched. Changes to
    /// files already in the snapshot are ignored.
    pub async fn await_new_stable_file(&self, timeout: Duration) -> Result<Option<DownloadEvent>> {
        let detector = &self.detector;
        let deadline = Instant::now() + timeout;

        loop {
            let newest = detector
                .list()
                .await?
                .into_iter()
                .filter(|(path, _)| !self.files.contains(path))
                .max_by_key(|(_, created)| *created);

            if let Some((path, _)) = newest {
                let first_seen = SystemTime::now();
                log::info!("New download detected: {}", path.display());

                match detector.await_stable(&path, deadline).await? {
                    Stability::Stable(size) => {
                        log::info!("Download complete: {} ({} bytes)", path.display(), size);
                        return Ok(Some(DownloadEvent {
                            path,
                            first_seen,
                            size,
                            stable: true,
                        }));
                    }
                    Stability::Vanished => {
                        log::debug!("{} disappeared before settling", path.display());
                    }
                    Stability::TimedOut => {
                        log::warn!("{} never stopped growing", path.display());
                        return Ok(None);
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                log::warn!(
                    "No new file in {} after {:?}",
                    detector.dir.display(),
                    timeout
                );
                return Ok(None);
            }
            sleep(detector.poll.min(deadline - now)).await;
        }
    }
}
