// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod catalog;
mod checkpoint;
mod config;
mod locator;
mod task;

// Re-export all public types
pub use catalog::{CatalogConfig, LocatorTable, default_catalogs};
pub use checkpoint::Checkpoint;
pub use config::{
    Config, DelayConfig, DelayRange, TimeoutConfig, WebDriverConfig, WorkflowConfig, ms,
};
pub use locator::{Condition, LocatorSpec, NEXT_PAGE_PLACEHOLDER, Strategy};
pub use task::{
    Credentials, DownloadEvent, ExtractionRequest, PageStatus, PageTask, RunOutcome, RunSummary,
    Session,
};
