// src/lib.rs

//! Harvester: resumable, page-by-page citation export from catalogs
//! behind an identity-provider login.

pub mod browser;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
