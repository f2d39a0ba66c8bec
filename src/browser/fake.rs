//! Scripted in-memory catalog used by tests.
//!
//! Elements are registered per [`Strategy`] with a [`Role`]; whether a
//! role is currently on the page depends on the simulated session state
//! (logged in, searched, export panel open, current page). Clicking the
//! citation option writes an export file into the download directory.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::Browser;
use crate::error::{AppError, Result};
use crate::models::{
    CatalogConfig, Condition, Config, DelayConfig, LocatorSpec, LocatorTable, Strategy,
    TimeoutConfig,
};

pub const BASE_URL: &str = "https://catalog.example.org/";

/// Locator table where every target is `[#missing-<target>, #<target>]`.
pub fn test_locators() -> LocatorTable {
    let chain = |spec: &LocatorSpec| {
        LocatorSpec::new(
            spec.target.clone(),
            spec.condition,
            vec![
                Strategy::css(format!("#missing-{}", spec.target)),
                Strategy::css(format!("#{}", spec.target)),
            ],
        )
    };
    let d = LocatorTable::default();
    LocatorTable {
        idp_button: chain(&d.idp_button),
        email_field: chain(&d.email_field),
        password_field: chain(&d.password_field),
        landing_indicator: chain(&d.landing_indicator),
        search_input: chain(&d.search_input),
        search_submit: chain(&d.search_submit),
        results_indicator: chain(&d.results_indicator),
        result_rows: chain(&d.result_rows),
        row_checkbox: chain(&d.row_checkbox),
        select_all: chain(&d.select_all),
        export_button: chain(&d.export_button),
        export_panel: chain(&d.export_panel),
        citation_option: chain(&d.citation_option),
        next_page: chain(&d.next_page),
    }
}

pub fn test_catalog() -> CatalogConfig {
    CatalogConfig {
        id: "test".into(),
        base_url: BASE_URL.into(),
        query: "generative ai".into(),
        locators: test_locators(),
    }
}

/// Configuration with the test catalog, no pauses and short download waits.
pub fn fast_config() -> Config {
    Config {
        timeouts: TimeoutConfig {
            url_change_ms: 50,
            download_ms: 300,
            download_poll_ms: 10,
            stability_poll_ms: 5,
            ..TimeoutConfig::default()
        },
        delays: DelayConfig::none(),
        catalogs: vec![test_catalog()],
        ..Config::default()
    }
}

/// What a registered element represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    IdpButton,
    EmailField,
    PasswordField,
    Landing,
    SearchInput,
    SearchSubmit,
    Results,
    Row(usize),
    RowCheckbox(usize),
    SelectAll,
    ExportButton,
    ExportPanel,
    CitationOption,
    NextPage,
    Other,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub role: Role,
}

/// Observable state of the simulated catalog.
#[derive(Debug)]
pub struct FakeState {
    pub url: String,
    pub page: u32,
    pub last_page: u32,
    pub registry: HashMap<Strategy, Role>,
    pub row_checkbox_strategy: Option<Strategy>,
    pub rows: usize,
    pub selected: Vec<bool>,
    pub idp_flow: bool,
    pub idp_clicked: bool,
    pub email_submitted: bool,
    pub logged_in: bool,
    pub searched: bool,
    pub enter_submits: bool,
    pub select_all_works: bool,
    pub next_control: bool,
    /// Roles whose clicks fail with a driver error
    pub broken_clicks: HashSet<Role>,
    pub export_open: bool,
    pub download_dir: PathBuf,
    /// Remaining citation clicks that produce no file, per page
    pub failing_downloads: HashMap<u32, u32>,
    pub pages_without_rows: HashSet<u32>,
    pub downloads: u32,
    pub tried: Vec<Strategy>,
    pub clicks: Vec<Role>,
    pub typed: HashMap<Role, String>,
    pub gotos: Vec<String>,
    pub refreshes: u32,
    pub form_submits: u32,
}

pub struct FakeBrowser {
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    /// A fake with nothing registered.
    pub fn empty(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: BASE_URL.to_string(),
                page: 1,
                last_page: u32::MAX,
                registry: HashMap::new(),
                row_checkbox_strategy: None,
                rows: 0,
                selected: Vec::new(),
                idp_flow: true,
                idp_clicked: false,
                email_submitted: false,
                logged_in: false,
                searched: false,
                enter_submits: true,
                select_all_works: true,
                next_control: true,
                broken_clicks: HashSet::new(),
                export_open: false,
                download_dir: download_dir.into(),
                failing_downloads: HashMap::new(),
                pages_without_rows: HashSet::new(),
                downloads: 0,
                tried: Vec::new(),
                clicks: Vec::new(),
                typed: HashMap::new(),
                gotos: Vec::new(),
                refreshes: 0,
                form_submits: 0,
            }),
        }
    }

    /// A fake catalog where the last strategy of every locator matches.
    pub fn catalog(table: &LocatorTable, rows: usize, download_dir: impl Into<PathBuf>) -> Self {
        let fake = Self::empty(download_dir);
        {
            let mut state = fake.state();
            state.register_last(&table.idp_button, Role::IdpButton);
            state.register_last(&table.email_field, Role::EmailField);
            state.register_last(&table.password_field, Role::PasswordField);
            state.register_last(&table.landing_indicator, Role::Landing);
            state.register_last(&table.search_input, Role::SearchInput);
            state.register_last(&table.search_submit, Role::SearchSubmit);
            state.register_last(&table.results_indicator, Role::Results);
            state.register_last(&table.select_all, Role::SelectAll);
            state.register_last(&table.export_button, Role::ExportButton);
            state.register_last(&table.export_panel, Role::ExportPanel);
            state.register_last(&table.citation_option, Role::CitationOption);
            state.register_last(&table.next_page, Role::NextPage);
            state.register_last(&table.result_rows, Role::Row(0));
            state.row_checkbox_strategy = table.row_checkbox.strategies.last().cloned();
            state.rows = rows;
            state.selected = vec![false; rows];
        }
        fake
    }

    /// Lock the simulated state for setup or assertions.
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start on the first results page of a signed-in session.
    pub fn on_results(self) -> Self {
        {
            let mut state = self.state();
            state.logged_in = true;
            state.submit_search();
        }
        self
    }

    pub fn register(&self, strategy: Strategy, role: Role) {
        self.state().registry.insert(strategy, role);
    }
}

impl FakeState {
    fn register_last(&mut self, spec: &LocatorSpec, role: Role) {
        if let Some(strategy) = spec.strategies.last() {
            self.registry.insert(strategy.clone(), role);
        }
    }

    fn available(&self, role: Role) -> bool {
        let has_rows = self.searched && !self.pages_without_rows.contains(&self.page);
        match role {
            Role::IdpButton => self.idp_flow && !self.logged_in,
            Role::EmailField => self.idp_clicked && !self.logged_in,
            Role::PasswordField => self.email_submitted && !self.logged_in,
            Role::Landing | Role::SearchInput => self.logged_in,
            Role::SearchSubmit => self.logged_in && !self.searched,
            Role::Results | Role::SelectAll | Role::ExportButton => has_rows,
            Role::Row(_) | Role::RowCheckbox(_) => has_rows,
            Role::ExportPanel | Role::CitationOption => self.export_open,
            Role::NextPage => self.searched && self.next_control && self.page < self.last_page,
            Role::Other => true,
        }
    }

    fn show_page(&mut self, page: u32) {
        self.page = page;
        self.url = format!("{BASE_URL}search?qs=query&page={page}");
        self.reset_page();
    }

    fn reset_page(&mut self) {
        self.export_open = false;
        self.selected = vec![false; self.rows];
    }

    fn submit_search(&mut self) {
        self.searched = true;
        self.page = 1;
        self.url = format!("{BASE_URL}search?qs=query");
        self.reset_page();
    }

    fn write_download(&mut self) -> Result<()> {
        if let Some(remaining) = self.failing_downloads.get_mut(&self.page) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(());
            }
        }
        self.downloads += 1;
        let path = self
            .download_dir
            .join(format!("export-page{}-{}.bib", self.page, self.downloads));
        std::fs::write(path, format!("@article{{page{},\n  title={{x}}\n}}\n", self.page))?;
        Ok(())
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state();
        state.gotos.push(url.to_string());
        if url == BASE_URL {
            state.url = url.to_string();
            return Ok(());
        }
        let parsed = url::Url::parse(url)?;
        let page = parsed
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse::<u32>().ok())
            .unwrap_or(1);
        if page > state.last_page {
            state.searched = false;
        }
        state.show_page(page);
        state.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state().url.clone())
    }

    async fn refresh(&self) -> Result<()> {
        let mut state = self.state();
        state.refreshes += 1;
        state.reset_page();
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok("Fake catalog".to_string())
    }

    async fn page_source(&self) -> Result<String> {
        Ok("<html><body><button>Export</button></body></html>".to_string())
    }

    async fn wait_for(
        &self,
        strategy: &Strategy,
        _condition: Condition,
        _timeout: Duration,
    ) -> Result<Option<FakeElement>> {
        let mut state = self.state();
        state.tried.push(strategy.clone());
        Ok(state
            .registry
            .get(strategy)
            .copied()
            .filter(|role| state.available(*role))
            .map(|role| FakeElement { role }))
    }

    async fn find_all(&self, strategy: &Strategy) -> Result<Vec<FakeElement>> {
        let state = self.state();
        match state.registry.get(strategy).copied() {
            Some(Role::Row(_)) if state.available(Role::Row(0)) => Ok((0..state.rows)
                .map(|i| FakeElement { role: Role::Row(i) })
                .collect()),
            Some(role) if !matches!(role, Role::Row(_)) && state.available(role) => {
                Ok(vec![FakeElement { role }])
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn find_in(&self, parent: &FakeElement, strategy: &Strategy) -> Result<Option<FakeElement>> {
        let state = self.state();
        match parent.role {
            Role::Row(i) if state.row_checkbox_strategy.as_ref() == Some(strategy) => {
                Ok(Some(FakeElement {
                    role: Role::RowCheckbox(i),
                }))
            }
            _ => Ok(None),
        }
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        let mut state = self.state();
        if !state.available(element.role) {
            return Err(AppError::validation(format!(
                "stale element {:?}",
                element.role
            )));
        }
        if state.broken_clicks.contains(&element.role) {
            return Err(AppError::validation(format!(
                "click on {:?} intercepted",
                element.role
            )));
        }
        state.clicks.push(element.role);
        match element.role {
            Role::IdpButton => state.idp_clicked = true,
            Role::SearchSubmit => state.submit_search(),
            Role::SelectAll => {
                if state.select_all_works {
                    state.selected.iter_mut().for_each(|s| *s = true);
                }
            }
            Role::RowCheckbox(i) => {
                if let Some(selected) = state.selected.get_mut(i) {
                    *selected = !*selected;
                }
            }
            Role::ExportButton => state.export_open = true,
            Role::CitationOption => {
                state.export_open = false;
                state.write_download()?;
            }
            Role::NextPage => {
                let next = state.page + 1;
                state.show_page(next);
            }
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self, element: &FakeElement) -> Result<()> {
        self.state().typed.remove(&element.role);
        Ok(())
    }

    async fn send_keys(&self, element: &FakeElement, text: &str) -> Result<()> {
        self.state()
            .typed
            .entry(element.role)
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn press_enter(&self, element: &FakeElement) -> Result<()> {
        let mut state = self.state();
        match element.role {
            Role::EmailField => state.email_submitted = true,
            Role::PasswordField => state.logged_in = true,
            Role::SearchInput if state.enter_submits => state.submit_search(),
            _ => {}
        }
        Ok(())
    }

    async fn is_selected(&self, element: &FakeElement) -> Result<bool> {
        let state = self.state();
        Ok(match element.role {
            Role::RowCheckbox(i) => state.selected.get(i).copied().unwrap_or(false),
            _ => false,
        })
    }

    async fn is_present(&self, element: &FakeElement) -> Result<bool> {
        Ok(self.state().available(element.role))
    }

    async fn submit_form(&self, _element: &FakeElement) -> Result<()> {
        let mut state = self.state();
        state.form_submits += 1;
        state.submit_search();
        Ok(())
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<()> {
        Ok(())
    }
}
