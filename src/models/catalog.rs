// src/models/catalog.rs

//! Catalog definitions and their locator tables.

use serde::{Deserialize, Serialize};

use super::locator::{Condition, LocatorSpec, Strategy};
use crate::error::{AppError, Result};

/// One searchable catalog behind an identity-provider login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Identifier used on the command line, e.g. `sciencedirect`
    pub id: String,

    /// Entry point that redirects to the identity provider
    pub base_url: String,

    /// Fixed search query typed into the catalog
    pub query: String,

    /// Ordered locator chains for every UI target
    #[serde(default)]
    pub locators: LocatorTable,
}

impl CatalogConfig {
    /// Validate that the catalog is usable.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::validation("catalog id is empty"));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            AppError::validation(format!("catalog '{}' base_url: {e}", self.id))
        })?;
        if self.query.trim().is_empty() {
            return Err(AppError::validation(format!(
                "catalog '{}' has an empty query",
                self.id
            )));
        }
        for spec in self.locators.all() {
            if spec.strategies.is_empty() {
                return Err(AppError::validation(format!(
                    "catalog '{}': locator '{}' has no strategies",
                    self.id, spec.target
                )));
            }
        }
        Ok(())
    }
}

/// Locator chains for every target the workflow interacts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorTable {
    #[serde(default = "defaults::idp_button")]
    pub idp_button: LocatorSpec,
    #[serde(default = "defaults::email_field")]
    pub email_field: LocatorSpec,
    #[serde(default = "defaults::password_field")]
    pub password_field: LocatorSpec,
    /// Indicators that the authenticated landing page is loaded
    #[serde(default = "defaults::landing_indicator")]
    pub landing_indicator: LocatorSpec,
    #[serde(default = "defaults::search_input")]
    pub search_input: LocatorSpec,
    #[serde(default = "defaults::search_submit")]
    pub search_submit: LocatorSpec,
    /// Indicators that a result list is rendered
    #[serde(default = "defaults::results_indicator")]
    pub results_indicator: LocatorSpec,
    #[serde(default = "defaults::result_rows")]
    pub result_rows: LocatorSpec,
    /// Checkbox inside a single result row (searched within the row)
    #[serde(default = "defaults::row_checkbox")]
    pub row_checkbox: LocatorSpec,
    #[serde(default = "defaults::select_all")]
    pub select_all: LocatorSpec,
    #[serde(default = "defaults::export_button")]
    pub export_button: LocatorSpec,
    #[serde(default = "defaults::export_panel")]
    pub export_panel: LocatorSpec,
    #[serde(default = "defaults::citation_option")]
    pub citation_option: LocatorSpec,
    /// May contain the `{next_page}` placeholder
    #[serde(default = "defaults::next_page")]
    pub next_page: LocatorSpec,
}

impl LocatorTable {
    /// Every spec in the table.
    pub fn all(&self) -> [&LocatorSpec; 14] {
        [
            &self.idp_button,
            &self.email_field,
            &self.password_field,
            &self.landing_indicator,
            &self.search_input,
            &self.search_submit,
            &self.results_indicator,
            &self.result_rows,
            &self.row_checkbox,
            &self.select_all,
            &self.export_button,
            &self.export_panel,
            &self.citation_option,
            &self.next_page,
        ]
    }
}

impl Default for LocatorTable {
    fn default() -> Self {
        Self {
            idp_button: defaults::idp_button(),
            email_field: defaults::email_field(),
            password_field: defaults::password_field(),
            landing_indicator: defaults::landing_indicator(),
            search_input: defaults::search_input(),
            search_submit: defaults::search_submit(),
            results_indicator: defaults::results_indicator(),
            result_rows: defaults::result_rows(),
            row_checkbox: defaults::row_checkbox(),
            select_all: defaults::select_all(),
            export_button: defaults::export_button(),
            export_panel: defaults::export_panel(),
            citation_option: defaults::citation_option(),
            next_page: defaults::next_page(),
        }
    }
}

/// The catalog shipped with the default configuration.
pub fn default_catalogs() -> Vec<CatalogConfig> {
    vec![CatalogConfig {
        id: "sciencedirect".to_string(),
        base_url: "https://www-sciencedirect-com.crai.referencistas.com/".to_string(),
        query: "generative artificial intelligence".to_string(),
        locators: LocatorTable::default(),
    }]
}

mod defaults {
    use super::{Condition, LocatorSpec, Strategy};

    fn spec(target: &str, condition: Condition, strategies: Vec<Strategy>) -> LocatorSpec {
        LocatorSpec::new(target, condition, strategies)
    }

    fn css(v: &str) -> Strategy {
        Strategy::css(v)
    }

    fn xpath(v: &str) -> Strategy {
        Strategy::xpath(v)
    }

    pub fn idp_button() -> LocatorSpec {
        spec("idp_button", Condition::Clickable, vec![Strategy::id("btn-google")])
    }

    pub fn email_field() -> LocatorSpec {
        spec("email_field", Condition::Visible, vec![Strategy::id("identifierId")])
    }

    pub fn password_field() -> LocatorSpec {
        spec("password_field", Condition::Visible, vec![Strategy::name("Passwd")])
    }

    pub fn landing_indicator() -> LocatorSpec {
        spec(
            "landing_indicator",
            Condition::Present,
            vec![
                Strategy::id("search-input-field"),
                Strategy::name("qs"),
                css("input[placeholder*='Search']"),
                css("input[type='search']"),
                xpath("//input[contains(@placeholder, 'Search')]"),
            ],
        )
    }

    pub fn search_input() -> LocatorSpec {
        spec(
            "search_input",
            Condition::Clickable,
            vec![
                Strategy::id("search-input-field"),
                Strategy::name("qs"),
                css("input[placeholder*='Search']"),
                css("input[type='search']"),
                xpath("//input[contains(@placeholder, 'Search')]"),
                xpath("//input[contains(@class, 'search')]"),
                css(".search-input"),
                css("#srp-term"),
            ],
        )
    }

    pub fn search_submit() -> LocatorSpec {
        spec(
            "search_submit",
            Condition::Clickable,
            vec![
                css("button[type='submit']"),
                xpath("//button[contains(@class, 'search')]"),
                xpath("//button[contains(text(), 'Search')]"),
                css(".search-button"),
                Strategy::id("search-button"),
            ],
        )
    }

    pub fn results_indicator() -> LocatorSpec {
        spec(
            "results_indicator",
            Condition::Present,
            vec![
                Strategy::id("srp-results-list"),
                css("li.ResultItem"),
                css(".search-result"),
                xpath("//div[contains(@class, 'result')]"),
            ],
        )
    }

    pub fn result_rows() -> LocatorSpec {
        spec(
            "result_rows",
            Condition::Present,
            vec![
                css("li.ResultItem"),
                css(".search-result-item"),
                css(".result-item"),
                css("[data-testid='search-result']"),
                css(".search-body .result"),
            ],
        )
    }

    pub fn row_checkbox() -> LocatorSpec {
        spec(
            "row_checkbox",
            Condition::Present,
            vec![
                css("input[type='checkbox']"),
                css(".checkbox input"),
                css("[data-testid*='checkbox']"),
                css(".result-checkbox input"),
            ],
        )
    }

    pub fn select_all() -> LocatorSpec {
        spec(
            "select_all",
            Condition::Clickable,
            vec![
                Strategy::id("srp-select-all"),
                css("input[type='checkbox'][data-testid='select-all']"),
                xpath("//input[@type='checkbox' and contains(@id, 'select-all')]"),
                css(".select-all-checkbox"),
                xpath("//input[@type='checkbox' and contains(@class, 'select-all')]"),
                xpath("//input[@type='checkbox' and @aria-label='Select all']"),
                css("input[aria-label*='Select all']"),
                css("input[title*='Select all']"),
                xpath("//label[contains(text(), 'Select all')]/input"),
                xpath("//button[contains(text(), 'Select all')]"),
                css("button[data-testid*='select-all']"),
                css(".results-header input[type='checkbox']"),
                css(".search-results-header input[type='checkbox']"),
                xpath("//div[contains(@class, 'header')]//input[@type='checkbox']"),
            ],
        )
    }

    pub fn export_button() -> LocatorSpec {
        spec(
            "export_button",
            Condition::Clickable,
            vec![
                xpath("//button[contains(., 'Export')]"),
                css("button[data-testid='export']"),
                xpath("//button[contains(@class, 'export')]"),
                xpath("//button[contains(text(), 'EXPORT')]"),
                xpath("//a[contains(text(), 'Export')]"),
                css("button[aria-label*='Export']"),
                css("a[aria-label*='Export']"),
                xpath("//button[contains(., 'Download')]"),
                xpath("//a[contains(., 'Download')]"),
                xpath("//button[contains(., 'Citation')]"),
                xpath("//a[contains(., 'Citation')]"),
                css(".export-button"),
                css(".download-button"),
                css("button[class*='export']"),
                css("a[class*='export']"),
                xpath("//div[contains(@class, 'actions')]//button[contains(., 'Export')]"),
                xpath("//div[contains(@class, 'toolbar')]//button[contains(., 'Export')]"),
            ],
        )
    }

    pub fn export_panel() -> LocatorSpec {
        spec(
            "export_panel",
            Condition::Visible,
            vec![css(".ReactModal__Body--open"), css("[role='dialog']")],
        )
    }

    pub fn citation_option() -> LocatorSpec {
        spec(
            "citation_option",
            Condition::Clickable,
            vec![xpath("//button[contains(., 'Export citation to BibTeX')]")],
        )
    }

    pub fn next_page() -> LocatorSpec {
        spec(
            "next_page",
            Condition::Clickable,
            vec![
                css("li.pagination-link.next-link"),
                css("li.pagination-link.next-link a"),
                css("a[data-test-id='next-page']"),
                xpath("//a[contains(@class, 'next-page')]"),
                xpath("//a[contains(text(), 'Next')]"),
                css(".pagination-next"),
                css("a[aria-label*='Next']"),
                css("a[title*='Next']"),
                xpath("//nav[contains(@class, 'pagination')]//a[contains(text(), 'Next')]"),
                xpath("//a[contains(@class, 'next') or contains(@class, 'forward')]"),
                xpath("//button[contains(@class, 'next') or contains(@class, 'forward')]"),
                xpath("//a[contains(text(), '→') or contains(text(), '»')]"),
                xpath("//a[normalize-space(text())='{next_page}']"),
            ],
        )
    }
}
