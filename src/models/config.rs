//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogConfig, default_catalogs};
use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// WebDriver connection settings
    #[serde(default)]
    pub webdriver: WebDriverConfig,

    /// Wait budgets for every blocking step
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Pauses between interactions
    #[serde(default)]
    pub delays: DelayConfig,

    /// Retry, selection and download behavior
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Catalog definitions
    #[serde(default = "default_catalogs")]
    pub catalogs: Vec<CatalogConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Look up a catalog by id.
    pub fn catalog(&self, id: &str) -> Result<&CatalogConfig> {
        self.catalogs
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::config(format!("Unknown catalog '{id}'")))
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.webdriver.url.trim().is_empty() {
            return Err(AppError::validation("webdriver.url is empty"));
        }
        url::Url::parse(&self.webdriver.url)
            .map_err(|e| AppError::validation(format!("webdriver.url: {e}")))?;
        if self.workflow.max_attempts == 0 {
            return Err(AppError::validation("workflow.max_attempts must be > 0"));
        }
        if self.workflow.max_rows_per_page == 0 {
            return Err(AppError::validation(
                "workflow.max_rows_per_page must be > 0",
            ));
        }
        if self.workflow.results_per_page == 0 {
            return Err(AppError::validation(
                "workflow.results_per_page must be > 0",
            ));
        }
        let file = self.workflow.checkpoint_file.trim();
        if file.is_empty() || file.contains('/') || file.contains('\\') {
            return Err(AppError::validation(
                "workflow.checkpoint_file must be a plain file name",
            ));
        }
        if self.timeouts.download_poll_ms == 0 || self.timeouts.stability_poll_ms == 0 {
            return Err(AppError::validation("poll intervals must be > 0"));
        }
        for (name, range) in self.delays.ranges() {
            if range.0 > range.1 {
                return Err(AppError::validation(format!(
                    "delays.{name}: min {} exceeds max {}",
                    range.0, range.1
                )));
            }
        }
        if self.catalogs.is_empty() {
            return Err(AppError::validation("No catalogs defined"));
        }
        let mut ids = HashSet::new();
        for catalog in &self.catalogs {
            catalog.validate()?;
            if !ids.insert(catalog.id.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate catalog id '{}'",
                    catalog.id
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webdriver: WebDriverConfig::default(),
            timeouts: TimeoutConfig::default(),
            delays: DelayConfig::default(),
            workflow: WorkflowConfig::default(),
            catalogs: default_catalogs(),
        }
    }
}

/// WebDriver server and browser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    /// URL of a running chromedriver (or compatible) server
    #[serde(default = "defaults::webdriver_url")]
    pub url: String,

    /// Run the browser without a window
    #[serde(default)]
    pub headless: bool,

    /// How long to wait for the server to report ready, in seconds
    #[serde(default = "defaults::startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Extra browser command-line arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: defaults::webdriver_url(),
            headless: false,
            startup_timeout_secs: defaults::startup_timeout(),
            args: Vec::new(),
        }
    }
}

/// Wait budgets in milliseconds.
///
/// Locator budgets apply per strategy, not per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "defaults::login_redirect")]
    pub login_redirect_ms: u64,
    #[serde(default = "defaults::login_field")]
    pub login_field_ms: u64,
    #[serde(default = "defaults::landing_probe")]
    pub landing_probe_ms: u64,
    #[serde(default = "defaults::landing_reprobe")]
    pub landing_reprobe_ms: u64,
    #[serde(default = "defaults::search_input")]
    pub search_input_ms: u64,
    #[serde(default = "defaults::search_submit")]
    pub search_submit_ms: u64,
    /// Budget for results to appear after each submission method
    #[serde(default = "defaults::submit_confirm")]
    pub submit_confirm_ms: u64,
    #[serde(default = "defaults::results")]
    pub results_ms: u64,
    #[serde(default = "defaults::rows")]
    pub rows_ms: u64,
    #[serde(default = "defaults::select_all")]
    pub select_all_ms: u64,
    #[serde(default = "defaults::export")]
    pub export_ms: u64,
    #[serde(default = "defaults::export_panel")]
    pub export_panel_ms: u64,
    #[serde(default = "defaults::next_page")]
    pub next_page_ms: u64,
    #[serde(default = "defaults::url_change")]
    pub url_change_ms: u64,
    #[serde(default = "defaults::page_load")]
    pub page_load_ms: u64,
    #[serde(default = "defaults::download")]
    pub download_ms: u64,
    #[serde(default = "defaults::download_poll")]
    pub download_poll_ms: u64,
    #[serde(default = "defaults::stability_poll")]
    pub stability_poll_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            login_redirect_ms: defaults::login_redirect(),
            login_field_ms: defaults::login_field(),
            landing_probe_ms: defaults::landing_probe(),
            landing_reprobe_ms: defaults::landing_reprobe(),
            search_input_ms: defaults::search_input(),
            search_submit_ms: defaults::search_submit(),
            submit_confirm_ms: defaults::submit_confirm(),
            results_ms: defaults::results(),
            rows_ms: defaults::rows(),
            select_all_ms: defaults::select_all(),
            export_ms: defaults::export(),
            export_panel_ms: defaults::export_panel(),
            next_page_ms: defaults::next_page(),
            url_change_ms: defaults::url_change(),
            page_load_ms: defaults::page_load(),
            download_ms: defaults::download(),
            download_poll_ms: defaults::download_poll(),
            stability_poll_ms: defaults::stability_poll(),
        }
    }
}

/// Inclusive `[min, max]` range in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange(pub u64, pub u64);

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange(0, 0);
}

/// Pauses between interactions, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Between typed characters
    #[serde(default = "defaults::keystroke")]
    pub keystroke_ms: DelayRange,
    /// After submitting the email or password
    #[serde(default = "defaults::after_login_step")]
    pub after_login_step_ms: DelayRange,
    /// After result rows have been selected
    #[serde(default = "defaults::after_selection")]
    pub after_selection_ms: DelayRange,
    /// After moving to another result page
    #[serde(default = "defaults::after_pagination")]
    pub after_pagination_ms: DelayRange,
    /// After clearing or focusing a field
    #[serde(default = "defaults::field_settle")]
    pub field_settle_ms: u64,
    /// Between attempts on the same page, after the reload
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
    /// After reloading a page that exhausted its attempts
    #[serde(default = "defaults::failure_reload")]
    pub failure_reload_ms: u64,
}

impl DelayConfig {
    /// Disable every pause.
    pub fn none() -> Self {
        Self {
            keystroke_ms: DelayRange::ZERO,
            after_login_step_ms: DelayRange::ZERO,
            after_selection_ms: DelayRange::ZERO,
            after_pagination_ms: DelayRange::ZERO,
            field_settle_ms: 0,
            retry_backoff_ms: 0,
            failure_reload_ms: 0,
        }
    }

    fn ranges(&self) -> [(&'static str, DelayRange); 4] {
        [
            ("keystroke_ms", self.keystroke_ms),
            ("after_login_step_ms", self.after_login_step_ms),
            ("after_selection_ms", self.after_selection_ms),
            ("after_pagination_ms", self.after_pagination_ms),
        ]
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            keystroke_ms: defaults::keystroke(),
            after_login_step_ms: defaults::after_login_step(),
            after_selection_ms: defaults::after_selection(),
            after_pagination_ms: defaults::after_pagination(),
            field_settle_ms: defaults::field_settle(),
            retry_backoff_ms: defaults::retry_backoff(),
            failure_reload_ms: defaults::failure_reload(),
        }
    }
}

/// Retry, selection, download and pagination behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Attempts per page before giving up on it
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Cap on individually selected rows when bulk selection is unavailable
    #[serde(default = "defaults::max_rows_per_page")]
    pub max_rows_per_page: usize,

    /// Page size assumed when rewriting offset-style pagination parameters
    #[serde(default = "defaults::results_per_page")]
    pub results_per_page: u32,

    /// Checkpoint file name inside the download directory
    #[serde(default = "defaults::checkpoint_file")]
    pub checkpoint_file: String,

    /// In-progress download suffixes ignored by the download detector
    #[serde(default = "defaults::ignored_download_suffixes")]
    pub ignored_download_suffixes: Vec<String>,

    /// Query parameters holding a 1-based page number
    #[serde(default = "defaults::page_params")]
    pub page_params: Vec<String>,

    /// Query parameters holding a 0-based result offset
    #[serde(default = "defaults::offset_params")]
    pub offset_params: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            max_rows_per_page: defaults::max_rows_per_page(),
            results_per_page: defaults::results_per_page(),
            checkpoint_file: defaults::checkpoint_file(),
            ignored_download_suffixes: defaults::ignored_download_suffixes(),
            page_params: defaults::page_params(),
            offset_params: defaults::offset_params(),
        }
    }
}

/// Milliseconds to [`Duration`].
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

mod defaults {
    use super::DelayRange;

    // WebDriver defaults
    pub fn webdriver_url() -> String {
        "http://localhost:9515".into()
    }
    pub fn startup_timeout() -> u64 {
        30
    }

    // Timeout defaults
    pub fn login_redirect() -> u64 {
        25_000
    }
    pub fn login_field() -> u64 {
        15_000
    }
    pub fn landing_probe() -> u64 {
        10_000
    }
    pub fn landing_reprobe() -> u64 {
        5_000
    }
    pub fn search_input() -> u64 {
        10_000
    }
    pub fn search_submit() -> u64 {
        5_000
    }
    pub fn submit_confirm() -> u64 {
        10_000
    }
    pub fn results() -> u64 {
        30_000
    }
    pub fn rows() -> u64 {
        20_000
    }
    pub fn select_all() -> u64 {
        5_000
    }
    pub fn export() -> u64 {
        5_000
    }
    pub fn export_panel() -> u64 {
        15_000
    }
    pub fn next_page() -> u64 {
        5_000
    }
    pub fn url_change() -> u64 {
        10_000
    }
    pub fn page_load() -> u64 {
        15_000
    }
    pub fn download() -> u64 {
        20_000
    }
    pub fn download_poll() -> u64 {
        1_000
    }
    pub fn stability_poll() -> u64 {
        500
    }

    // Delay defaults
    pub fn keystroke() -> DelayRange {
        DelayRange(100, 200)
    }
    pub fn after_login_step() -> DelayRange {
        DelayRange(2_000, 4_000)
    }
    pub fn after_selection() -> DelayRange {
        DelayRange(2_000, 4_000)
    }
    pub fn after_pagination() -> DelayRange {
        DelayRange(4_000, 6_000)
    }
    pub fn field_settle() -> u64 {
        500
    }
    pub fn retry_backoff() -> u64 {
        5_000
    }
    pub fn failure_reload() -> u64 {
        6_000
    }

    // Workflow defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn max_rows_per_page() -> usize {
        25
    }
    pub fn results_per_page() -> u32 {
        25
    }
    pub fn checkpoint_file() -> String {
        "sd_scraping_progress.json".into()
    }
    pub fn ignored_download_suffixes() -> Vec<String> {
        vec![".crdownload".into(), ".part".into(), ".tmp".into()]
    }
    pub fn page_params() -> Vec<String> {
        vec!["page".into()]
    }
    pub fn offset_params() -> Vec<String> {
        vec!["offset".into(), "start".into()]
    }
}
