//! Service layer for the harvester.
//!
//! This module contains the building blocks the page workflow composes:
//! - Ordered-fallback element lookup (`LocatorResolver`)
//! - Download completion detection (`DownloadDetector`)
//! - Resume bookkeeping (`CheckpointManager`)
//! - Identity-provider login (`SessionController`)

mod checkpoint;
mod download;
mod locator;
mod session;

pub use checkpoint::CheckpointManager;
pub use download::{DirectorySnapshot, DownloadDetector};
pub use locator::{LocatorResolver, Resolved};
pub use session::SessionController;
