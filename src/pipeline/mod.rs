//! Extraction pipeline.
//!
//! - `run_extraction`: resume, log in, search and export page by page
//! - `PageWorkflow`: the per-page state machine
//! - `fallback`: ordered "first success wins" method chains

pub mod fallback;
pub mod run;
pub mod workflow;

pub use run::{run_extraction, run_extraction_with};
pub use workflow::{Advance, PageWorkflow, WorkflowState};
