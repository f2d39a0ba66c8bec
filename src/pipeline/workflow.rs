// src/pipeline/workflow.rs

//! Per-page extraction state machine.
//!
//! ```text
//! Idle -> Searching -> Selecting -> Exporting -> AwaitingDownload -> Checkpointed
//!                         ^                                             |
//!                         +------------------ NextPage <----------------+--> Done
//! ```
//!
//! Searching happens once per run. Selecting, Exporting and
//! AwaitingDownload are retried as a unit, with a reload in between, up to
//! `workflow.max_attempts` times per page.

use tokio::time::{Instant, sleep};

use crate::browser::{Browser, log_page_state};
use crate::error::{AppError, Result};
use crate::models::{
    CatalogConfig, Config, DownloadEvent, PageStatus, PageTask, TimeoutConfig, ms,
};
use crate::pipeline::fallback::{Outcome, first_success, step};
use crate::services::{CheckpointManager, DirectorySnapshot, DownloadDetector, LocatorResolver};
use crate::storage::CheckpointStore;
use crate::utils::{next_page_url, page_url, pause, random_delay, type_like_human};

/// Interval between URL checks after clicking a pagination control.
const URL_POLL_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Searching,
    Selecting,
    Exporting,
    AwaitingDownload,
    Checkpointed,
    NextPage,
    Done,
    Failed,
}

/// Where pagination left the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The last requested page was processed
    Done,
    /// Now on the given page
    Moved(u32),
}

/// Drives search, selection, export, download and pagination for one run.
pub struct PageWorkflow<'a, B: Browser + ?Sized, S: CheckpointStore> {
    browser: &'a B,
    config: &'a Config,
    catalog: &'a CatalogConfig,
    detector: DownloadDetector,
    checkpoints: CheckpointManager<S>,
    state: WorkflowState,
}

impl<'a, B: Browser + ?Sized, S: CheckpointStore> PageWorkflow<'a, B, S> {
    pub fn new(
        browser: &'a B,
        config: &'a Config,
        catalog: &'a CatalogConfig,
        detector: DownloadDetector,
        checkpoints: CheckpointManager<S>,
    ) -> Self {
        Self {
            browser,
            config,
            catalog,
            detector,
            checkpoints,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn checkpoints(&self) -> &CheckpointManager<S> {
        &self.checkpoints
    }

    fn transition(&mut self, next: WorkflowState) {
        log::debug!("Workflow: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn resolver(&self) -> LocatorResolver<'a, B> {
        LocatorResolver::new(self.browser)
    }

    fn timeouts(&self) -> &TimeoutConfig {
        &self.config.timeouts
    }

    // --- Searching ---

    /// Run the catalog search. Any failure here is fatal for the run.
    pub async fn search(&mut self) -> Result<()> {
        self.transition(WorkflowState::Searching);
        let result = self.execute_search().await;
        if result.is_err() {
            self.transition(WorkflowState::Failed);
            log_page_state(self.browser, "search").await;
        }
        result
    }

    async fn execute_search(&self) -> Result<()> {
        let locators = &self.catalog.locators;
        let timeouts = self.timeouts();

        let input = self
            .resolver()
            .resolve(&locators.search_input, ms(timeouts.search_input_ms))
            .await
            .map_err(AppError::search)?;
        let field = &input.element;

        if let Err(e) = self.browser.scroll_into_view(field).await {
            log::debug!("Could not scroll search input into view: {e}");
        }
        pause(self.config.delays.field_settle_ms).await;
        self.browser.click(field).await.map_err(AppError::search)?;
        type_like_human(self.browser, field, &self.catalog.query, &self.config.delays)
            .await
            .map_err(AppError::search)?;
        log::info!("Searching for '{}'", self.catalog.query);

        // Each method counts only once results show up; the last one gets
        // the full results budget.
        let outcome = first_success(
            "search submit",
            vec![
                step("keyboard", async move {
                    self.browser.press_enter(field).await?;
                    self.results_within(timeouts.submit_confirm_ms).await
                }),
                step("submit control", async move {
                    let button = self
                        .resolver()
                        .resolve(&locators.search_submit, ms(timeouts.search_submit_ms))
                        .await?;
                    self.browser.click(&button.element).await?;
                    self.results_within(timeouts.submit_confirm_ms).await
                }),
                step("form submission", async move {
                    self.browser.submit_form(field).await?;
                    self.results_within(timeouts.results_ms).await
                }),
            ],
        )
        .await;

        match outcome {
            Outcome::Succeeded { value, .. } => {
                log::info!("Search results loaded (detected by {value})");
                Ok(())
            }
            Outcome::Exhausted { tried } => Err(AppError::search(format!(
                "no results after submitting the search ({})",
                tried.join("; ")
            ))),
        }
    }

    /// Strategy that found the results indicator, or `None` if it never appeared.
    async fn results_within(&self, budget_ms: u64) -> Result<Option<String>> {
        match self
            .resolver()
            .resolve(&self.catalog.locators.results_indicator, ms(budget_ms))
            .await
        {
            Ok(found) => Ok(Some(found.strategy.to_string())),
            Err(AppError::LocatorNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // --- Per-page processing ---

    /// Select, export and download one page, retrying up to the attempt limit.
    ///
    /// The checkpoint advances only after the download is stable. Exhausted
    /// attempts yield [`AppError::PageProcessing`]; fatal errors are returned
    /// as they are.
    pub async fn process_page(&mut self, task: &mut PageTask) -> Result<DownloadEvent> {
        let max_attempts = self.config.workflow.max_attempts;
        let mut last_error = None;

        while task.attempts < max_attempts {
            let attempt = task.begin_attempt();
            log::info!("Page {}: attempt {}/{}", task.page, attempt, max_attempts);

            match self.attempt_page(task.page).await {
                Ok(event) => {
                    self.checkpoints.save(task.page).await?;
                    self.transition(WorkflowState::Checkpointed);
                    task.status = PageStatus::Succeeded;
                    return Ok(event);
                }
                Err(e) if e.is_fatal() => {
                    self.transition(WorkflowState::Failed);
                    task.status = PageStatus::Failed;
                    return Err(e);
                }
                Err(e) => {
                    log::warn!("Page {}: attempt {} failed: {}", task.page, attempt, e);
                    log_page_state(self.browser, &format!("page {}", task.page)).await;
                    last_error = Some(e);
                    if task.attempts < max_attempts {
                        self.prepare_retry().await;
                    }
                }
            }
        }

        self.transition(WorkflowState::Failed);
        task.status = PageStatus::Failed;
        Err(AppError::PageProcessing {
            page: task.page,
            attempts: task.attempts,
            source: Box::new(
                last_error.unwrap_or_else(|| AppError::validation("no attempt was made")),
            ),
        })
    }

    async fn attempt_page(&mut self, page: u32) -> Result<DownloadEvent> {
        self.transition(WorkflowState::Selecting);
        let selected = self.select_results(page).await?;
        log::info!("Page {page}: {selected} results selected");
        random_delay(self.config.delays.after_selection_ms).await;

        self.transition(WorkflowState::Exporting);
        let snapshot = self.trigger_export(page).await?;

        self.transition(WorkflowState::AwaitingDownload);
        let timeout_ms = self.timeouts().download_ms;
        match snapshot.await_new_stable_file(ms(timeout_ms)).await? {
            Some(event) => {
                log::info!("Page {page}: export saved to {}", event.path.display());
                Ok(event)
            }
            None => Err(AppError::DownloadTimeout { page, timeout_ms }),
        }
    }

    /// Select the page's results, in bulk when possible. Returns the count.
    async fn select_results(&self, page: u32) -> Result<usize> {
        let locators = &self.catalog.locators;
        let timeouts = self.timeouts();
        let resolver = self.resolver();

        resolver
            .resolve(&locators.result_rows, ms(timeouts.rows_ms))
            .await
            .map_err(|e| AppError::selection(page, e))?;
        let rows = resolver.find_all(&locators.result_rows).await?;
        if rows.is_empty() {
            return Err(AppError::selection(page, "no result rows on page"));
        }

        match resolver
            .resolve(&locators.select_all, ms(timeouts.select_all_ms))
            .await
        {
            Ok(select_all) => match self.browser.click(&select_all.element).await {
                Ok(()) => {
                    let (checkboxes, selected) = self.count_selected(&rows).await?;
                    if checkboxes == 0 {
                        log::warn!(
                            "Select-all clicked but row checkboxes cannot be inspected; assuming {} rows selected",
                            rows.len()
                        );
                        return Ok(rows.len());
                    }
                    if selected == checkboxes {
                        log::info!("Select-all ({}) selected {selected} rows", select_all.strategy);
                        return Ok(selected);
                    }
                    log::warn!(
                        "Select-all selected {selected} of {checkboxes} rows; selecting rows individually"
                    );
                }
                Err(e) => log::warn!("Select-all click failed ({e}); selecting rows individually"),
            },
            Err(e) => log::info!("{e}; selecting rows individually"),
        }

        let cap = self.config.workflow.max_rows_per_page;
        let mut selected = 0;
        for (i, row) in rows.iter().take(cap).enumerate() {
            let Some(checkbox) = resolver.find_in(row, &locators.row_checkbox).await? else {
                log::debug!("Row {}: no selection control", i + 1);
                continue;
            };
            match self.browser.is_selected(&checkbox).await {
                Ok(true) => selected += 1,
                Ok(false) => match self.browser.click(&checkbox).await {
                    Ok(()) => selected += 1,
                    Err(e) => log::debug!("Row {}: click failed: {e}", i + 1),
                },
                Err(e) => log::debug!("Row {}: state unknown: {e}", i + 1),
            }
        }

        if selected == 0 {
            return Err(AppError::selection(page, "no result row could be selected"));
        }
        if rows.len() > cap {
            log::info!("Selected the first {cap} of {} rows", rows.len());
        }
        Ok(selected)
    }

    /// Count row checkboxes found and how many of them are selected.
    async fn count_selected(&self, rows: &[B::Element]) -> Result<(usize, usize)> {
        let resolver = self.resolver();
        let mut checkboxes = 0;
        let mut selected = 0;
        for row in rows {
            if let Some(checkbox) = resolver
                .find_in(row, &self.catalog.locators.row_checkbox)
                .await?
            {
                checkboxes += 1;
                if self.browser.is_selected(&checkbox).await.unwrap_or(false) {
                    selected += 1;
                }
            }
        }
        Ok((checkboxes, selected))
    }

    /// Open the export panel and request the citation file.
    ///
    /// The returned snapshot is taken immediately before the final click.
    async fn trigger_export(&self, page: u32) -> Result<DirectorySnapshot> {
        let locators = &self.catalog.locators;
        let timeouts = self.timeouts();
        let resolver = self.resolver();
        let export_error = |e: AppError| AppError::export(page, e);

        let export = resolver
            .resolve(&locators.export_button, ms(timeouts.export_ms))
            .await
            .map_err(export_error)?;
        self.browser
            .click(&export.element)
            .await
            .map_err(export_error)?;

        resolver
            .resolve(&locators.export_panel, ms(timeouts.export_panel_ms))
            .await
            .map_err(export_error)?;
        let option = resolver
            .resolve(&locators.citation_option, ms(timeouts.export_ms))
            .await
            .map_err(export_error)?;

        let snapshot = self.detector.snapshot().await?;
        self.browser
            .click(&option.element)
            .await
            .map_err(export_error)?;
        log::info!(
            "Page {page}: citation export requested ({} files already present)",
            snapshot.len()
        );
        Ok(snapshot)
    }

    async fn prepare_retry(&self) {
        log::info!("Reloading page before retrying");
        if let Err(e) = self.browser.refresh().await {
            log::warn!("Reload failed: {e}");
        }
        pause(self.config.delays.retry_backoff_ms).await;
    }

    /// Reload the current URL after a page exhausted its attempts.
    pub async fn reload_current(&self) {
        match self.browser.current_url().await {
            Ok(url) => {
                if let Err(e) = self.browser.goto(&url).await {
                    log::warn!("Reload of {url} failed: {e}");
                }
            }
            Err(e) => log::warn!("Current URL unavailable: {e}"),
        }
        pause(self.config.delays.failure_reload_ms).await;
    }

    // --- Pagination ---

    /// Move from `page` to the next page, or finish at `max_pages`.
    pub async fn advance(&mut self, page: u32, max_pages: u32) -> Result<Advance> {
        if page >= max_pages {
            self.transition(WorkflowState::Done);
            log::info!("Reached the last requested page ({max_pages})");
            return Ok(Advance::Done);
        }

        self.transition(WorkflowState::NextPage);
        let next = page + 1;
        let outcome = first_success(
            "pagination",
            vec![
                step("next-page control", self.click_next(next)),
                step("url rewrite", self.rewrite_url(page)),
            ],
        )
        .await;

        match outcome {
            Outcome::Succeeded { method, .. } => {
                log::info!("Moved to page {next} via {method}");
                random_delay(self.config.delays.after_pagination_ms).await;
                Ok(Advance::Moved(next))
            }
            Outcome::Exhausted { tried } => {
                self.transition(WorkflowState::Failed);
                log_page_state(self.browser, "pagination").await;
                Err(AppError::navigation(next, tried.join("; ")))
            }
        }
    }

    /// Position the browser on `target` before the first page of a resumed run.
    ///
    /// Tries a direct URL jump first, then pages forward one control at a time.
    pub async fn jump_to(&mut self, target: u32) -> Result<()> {
        if target <= 1 {
            return Ok(());
        }
        log::info!("Jumping to page {target}");
        match self.goto_page(target).await {
            Ok(Some(())) => {
                random_delay(self.config.delays.after_pagination_ms).await;
                return Ok(());
            }
            Ok(None) => log::warn!("Direct jump to page {target} had no effect"),
            Err(e) => log::warn!("Direct jump to page {target} failed: {e}"),
        }

        log::info!("Paging forward to page {target}");
        let mut page = 1;
        while page < target {
            match self.advance(page, target).await? {
                Advance::Moved(next) => page = next,
                Advance::Done => break,
            }
        }
        Ok(())
    }

    async fn click_next(&self, next: u32) -> Result<Option<()>> {
        let spec = self.catalog.locators.next_page.for_next_page(next);
        let before = self.browser.current_url().await?;

        let control = self
            .resolver()
            .resolve(&spec, ms(self.timeouts().next_page_ms))
            .await?;
        if let Err(e) = self.browser.scroll_into_view(&control.element).await {
            log::debug!("Could not scroll next-page control into view: {e}");
        }
        self.browser.click(&control.element).await?;

        // An unchanged URL only counts as navigation if the control was
        // replaced by a re-rendered page.
        if !self.wait_for_url_change(&before).await? {
            if self.browser.is_present(&control.element).await.unwrap_or(true) {
                log::warn!(
                    "Next-page control ({}) left the page unchanged",
                    control.strategy
                );
                return Ok(None);
            }
            log::debug!("URL unchanged but the next-page control was replaced");
        }
        self.confirm_results().await
    }

    async fn rewrite_url(&self, page: u32) -> Result<Option<()>> {
        let current = self.browser.current_url().await?;
        let target = next_page_url(&current, page, &self.config.workflow)?;
        log::info!("Rewriting pagination URL to {target}");
        self.browser.goto(&target).await?;
        self.confirm_results().await
    }

    async fn goto_page(&self, target: u32) -> Result<Option<()>> {
        let current = self.browser.current_url().await?;
        let url = page_url(&current, target, &self.config.workflow)?;
        self.browser.goto(&url).await?;
        self.confirm_results().await
    }

    /// Confirm the current page shows results.
    async fn confirm_results(&self) -> Result<Option<()>> {
        let found = self
            .resolver()
            .resolve(
                &self.catalog.locators.results_indicator,
                ms(self.timeouts().page_load_ms),
            )
            .await?;
        log::debug!("Results confirmed by {}", found.strategy);
        Ok(Some(()))
    }

    /// Poll until the URL differs from `before`; `false` on timeout.
    async fn wait_for_url_change(&self, before: &str) -> Result<bool> {
        let deadline = Instant::now() + ms(self.timeouts().url_change_ms);
        loop {
            if self.browser.current_url().await? != before {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            sleep(ms(URL_POLL_MS).min(deadline - now)).await;
        }
    }
}
