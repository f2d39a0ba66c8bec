// src/error.rs

//! Unified error handling for the harvester.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No strategy of a locator matched within its wait budget
    #[error("No element found for '{target}' (tried: {})", tried.join(", "))]
    LocatorNotFound { target: String, tried: Vec<String> },

    /// Authentication could not be established
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// The catalog search could not be executed
    #[error("Search failed: {0}")]
    SearchExecution(String),

    /// No result row could be selected on a page
    #[error("Selection failed on page {page}: {message}")]
    SelectionFailed { page: u32, message: String },

    /// The export control or citation option was not found
    #[error("Export not available on page {page}: {message}")]
    ExportNotFound { page: u32, message: String },

    /// No new stable file appeared in the download directory
    #[error("Download for page {page} did not complete within {timeout_ms} ms")]
    DownloadTimeout { page: u32, timeout_ms: u64 },

    /// A page failed on every attempt
    #[error("Page {page} failed after {attempts} attempts: {source}")]
    PageProcessing {
        page: u32,
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    /// Moving to the next result page failed
    #[error("Navigation to page {page} failed: {message}")]
    Navigation { page: u32, message: String },

    /// WebDriver command failed
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a locator-not-found error.
    pub fn locator_not_found(target: impl Into<String>, tried: Vec<String>) -> Self {
        Self::LocatorNotFound {
            target: target.into(),
            tried,
        }
    }

    /// Create a login error.
    pub fn login(message: impl fmt::Display) -> Self {
        Self::LoginFailed(message.to_string())
    }

    /// Create a search error.
    pub fn search(message: impl fmt::Display) -> Self {
        Self::SearchExecution(message.to_string())
    }

    /// Create a selection error for a page.
    pub fn selection(page: u32, message: impl fmt::Display) -> Self {
        Self::SelectionFailed {
            page,
            message: message.to_string(),
        }
    }

    /// Create an export error for a page.
    pub fn export(page: u32, message: impl fmt::Display) -> Self {
        Self::ExportNotFound {
            page,
            message: message.to_string(),
        }
    }

    /// Create a navigation error towards `page`.
    pub fn navigation(page: u32, message: impl fmt::Display) -> Self {
        Self::Navigation {
            page,
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error must abort the whole run.
    ///
    /// Page-local errors are consumed by the retry loop, page and
    /// navigation failures by the run driver.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LoginFailed(_)
                | Self::SearchExecution(_)
                | Self::Config(_)
                | Self::Validation(_)
                | Self::Io(_)
        )
    }
}
