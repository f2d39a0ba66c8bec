// src/models/task.rs

//! Run-time state for sessions, pages and whole runs.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// Login credentials. Never persisted and never logged.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated catalog session, one per run.
#[derive(Debug, Clone)]
pub struct Session {
    pub authenticated: bool,
    pub base_url: String,
    /// Whether the landing page was reached without going through the login form
    pub reused: bool,
}

/// Lifecycle of one result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

/// Work item for a single result page.
#[derive(Debug, Clone)]
pub struct PageTask {
    /// 1-based page number
    pub page: u32,
    pub status: PageStatus,
    pub attempts: u32,
}

impl PageTask {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            status: PageStatus::Pending,
            attempts: 0,
        }
    }

    /// Record the start of another attempt.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.status = PageStatus::InProgress;
        self.attempts
    }
}

/// A new download that stopped growing.
#[derive(Debug, Clone)]
pub struct DownloadEvent {
    pub path: PathBuf,
    pub first_seen: SystemTime,
    pub size: u64,
    pub stable: bool,
}

/// Parameters of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub catalog_id: String,
    pub credentials: Credentials,
    pub max_pages: u32,
    pub download_dir: PathBuf,
    pub resume: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The checkpoint already covered every requested page
    AlreadyComplete,
    /// Every page up to `max_pages` was attempted
    Finished,
    /// Pagination failed before `max_pages` was reached
    StoppedEarly,
}

/// What a run did, page by page.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub start_page: u32,
    pub max_pages: u32,
    pub completed: Vec<u32>,
    pub failed: Vec<u32>,
    pub outcome: RunOutcome,
}

impl RunSummary {
    pub fn new(start_page: u32, max_pages: u32) -> Self {
        Self {
            start_page,
            max_pages,
            completed: Vec::new(),
            failed: Vec::new(),
            outcome: RunOutcome::Finished,
        }
    }

    /// Pages that were attempted, in order.
    pub fn attempted(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.completed.iter().chain(&self.failed).copied().collect();
        pages.sort_unstable();
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("someone@example.org", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("someone@example.org"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn attempts_are_counted() {
        let mut task = PageTask::new(3);
        assert_eq!(task.status, PageStatus::Pending);
        assert_eq!(task.begin_attempt(), 1);
        assert_eq!(task.begin_attempt(), 2);
        assert_eq!(task.status, PageStatus::InProgress);
    }

    #[test]
    fn attempted_pages_are_sorted() {
        let mut summary = RunSummary::new(1, 3);
        summary.completed = vec![1, 3];
        summary.failed = vec![2];
        assert_eq!(summary.attempted(), vec![1, 2, 3]);
    }
}
