// src/services/checkpoint.rs

//! Resume bookkeeping on top of a [`CheckpointStore`].

use crate::error::{AppError, Result};
use crate::models::Checkpoint;
use crate::storage::CheckpointStore;

/// Loads the resume point and commits completed pages.
///
/// Within one run the stored page never exceeds `max_pages` and never
/// moves backwards.
pub struct CheckpointManager<S: CheckpointStore> {
    store: S,
    max_pages: u32,
    last_saved: Option<u32>,
}

impl<S: CheckpointStore> CheckpointManager<S> {
    pub fn new(store: S, max_pages: u32) -> Self {
        Self {
            store,
            max_pages,
            last_saved: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the stored checkpoint, if any.
    pub async fn load(&self) -> Result<Option<Checkpoint>> {
        self.store.load().await
    }

    /// First page this run should process.
    ///
    /// Without `resume` the run starts at page 1 regardless of any stored
    /// checkpoint. The result may exceed `max_pages`, meaning there is
    /// nothing left to do.
    pub async fn start_page(&mut self, resume: bool) -> Result<u32> {
        if !resume {
            log::info!("Starting fresh from page 1");
            return Ok(1);
        }
        match self.load().await? {
            Some(checkpoint) => {
                log::info!(
                    "Resuming after page {} (checkpoint from {})",
                    checkpoint.last_page,
                    checkpoint.timestamp.to_rfc3339()
                );
                self.last_saved = Some(checkpoint.last_page);
                Ok(checkpoint.next_page())
            }
            None => {
                log::info!("No checkpoint found, starting from page 1");
                Ok(1)
            }
        }
    }

    /// Commit `page` as the last completed page.
    pub async fn save(&mut self, page: u32) -> Result<Checkpoint> {
        if page == 0 || page > self.max_pages {
            return Err(AppError::validation(format!(
                "checkpoint page {page} outside 1..={}",
                self.max_pages
            )));
        }
        if let Some(last) = self.last_saved {
            if page < last {
                return Err(AppError::validation(format!(
                    "checkpoint would regress from page {last} to {page}"
                )));
            }
        }

        let checkpoint = Checkpoint::new(page);
        self.store.save(&checkpoint).await?;
        self.last_saved = Some(page);
        log::info!("Checkpoint saved: page {page}");
        Ok(checkpoint)
    }

    pub fn last_saved(&self) -> Option<u32> {
        self.last_saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalCheckpointStore;
    use tempfile::TempDir;

    fn manager(dir: &TempDir, max_pages: u32) -> CheckpointManager<LocalCheckpointStore> {
        CheckpointManager::new(LocalCheckpointStore::new(dir.path(), "progress.json"), max_pages)
    }

    #[tokio::test]
    async fn resume_starts_after_checkpoint() {
        let dir = TempDir::new().unwrap();
        manager(&dir, 10).save(4).await.unwrap();

        let mut resumed = manager(&dir, 10);
        assert_eq!(resumed.start_page(true).await.unwrap(), 5);
        assert_eq!(resumed.last_saved(), Some(4));
    }

    #[tokio::test]
    async fn fresh_run_ignores_checkpoint() {
        let dir = TempDir::new().unwrap();
        manager(&dir, 10).save(4).await.unwrap();
        assert_eq!(manager(&dir, 10).start_page(false).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn resume_without_checkpoint_starts_at_one() {
        let dir = TempDir::new().unwrap();
        assert_eq!(manager(&dir, 3).start_page(true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn start_page_may_exceed_max_pages() {
        let dir = TempDir::new().unwrap();
        manager(&dir, 3).save(3).await.unwrap();
        assert_eq!(manager(&dir, 3).start_page(true).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn rejects_pages_beyond_max() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir, 3);
        assert!(manager.save(4).await.is_err());
        assert!(manager.save(0).await.is_err());
        assert!(manager.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_regression_within_run() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir, 5);
        manager.save(3).await.unwrap();
        assert!(manager.save(2).await.is_err());
        assert_eq!(manager.load().await.unwrap().unwrap().last_page, 3);
    }
}
