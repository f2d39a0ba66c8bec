//! Local filesystem checkpoint storage.
//!
//! Writes go to a sibling `.tmp` file which is flushed, synced and then
//! renamed over the checkpoint, so a crash mid-write leaves the previous
//! checkpoint intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Checkpoint;
use crate::storage::CheckpointStore;

/// Checkpoint stored as a JSON file inside a directory.
#[derive(Debug, Clone)]
pub struct LocalCheckpointStore {
    root_dir: PathBuf,
    file_name: String,
}

impl LocalCheckpointStore {
    /// Create a store for `file_name` inside `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Full path of the checkpoint file.
    pub fn path(&self) -> PathBuf {
        self.root_dir.join(&self.file_name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path();
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path()).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl CheckpointStore for LocalCheckpointStore {
    async fn load(&self) -> Result<Option<Checkpoint>> {
        let Some(bytes) = self.read_bytes().await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Checkpoint>(&bytes) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable checkpoint {}: {}",
                    self.path().display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        self.write_bytes(&bytes).await?;
        log::debug!(
            "Checkpoint written to {} (last_page={})",
            self.path().display(),
            checkpoint.last_page
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LocalCheckpointStore {
        LocalCheckpointStore::new(dir.path(), "progress.json")
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&Checkpoint::new(4)).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.last_page, 4);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw["last_page"], 4);
        assert!(raw["timestamp"].is_string());
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&Checkpoint::new(1)).await.unwrap();
        store.save(&Checkpoint::new(2)).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["progress.json".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(store.path(), "{\"last_page\": 3, \"times").unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn interrupted_write_keeps_previous_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&Checkpoint::new(2)).await.unwrap();

        // A crash between temp write and rename leaves only a stray temp file
        std::fs::write(store.path().with_extension("tmp"), "{\"last_pa").unwrap();

        assert_eq!(store.load().await.unwrap().unwrap().last_page, 2);
    }

    #[tokio::test]
    async fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = LocalCheckpointStore::new(dir.path().join("nested/run"), "progress.json");
        store.save(&Checkpoint::new(1)).await.unwrap();
        assert!(store.path().exists());
    }
}
