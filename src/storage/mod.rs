//! Checkpoint persistence.
//!
//! The checkpoint is the only durable state of a run: one JSON file per
//! download directory holding the last fully completed page.
//!
//! ```text
//! {download_dir}/
//! ├── sd_scraping_progress.json   # {"last_page": 2, "timestamp": "..."}
//! └── <export files written by the browser>
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Checkpoint;

// Re-export for convenience
pub use local::LocalCheckpointStore;

/// Trait for checkpoint storage backends.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the stored checkpoint.
    ///
    /// Returns `None` when no checkpoint exists or it cannot be parsed.
    async fn load(&self) -> Result<Option<Checkpoint>>;

    /// Replace the stored checkpoint.
    ///
    /// Implementations must never leave a partially written checkpoint behind.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
}
