// src/pipeline/run.rs

//! Run driver: resume point, login, search and the page loop.

use crate::browser::Browser;
use crate::error::{AppError, Result};
use crate::models::{Config, ExtractionRequest, PageTask, RunOutcome, RunSummary};
use crate::pipeline::workflow::{Advance, PageWorkflow};
use crate::services::{CheckpointManager, DownloadDetector, SessionController};
use crate::storage::{CheckpointStore, LocalCheckpointStore};

/// Extract citation exports for pages `start..=max_pages` of one catalog.
///
/// A page that exhausts its attempts is skipped and the run moves on; a
/// pagination failure ends the run early with the pages done so far.
/// Only login, search, configuration and checkpoint I/O errors are
/// returned as `Err`.
pub async fn run_extraction<B: Browser + ?Sized>(
    browser: &B,
    config: &Config,
    request: &ExtractionRequest,
) -> Result<RunSummary> {
    let store = LocalCheckpointStore::new(&request.download_dir, &config.workflow.checkpoint_file);
    run_extraction_with(browser, config, request, store).await
}

/// [`run_extraction`] with an explicit checkpoint backend.
pub async fn run_extraction_with<B, S>(
    browser: &B,
    config: &Config,
    request: &ExtractionRequest,
    store: S,
) -> Result<RunSummary>
where
    B: Browser + ?Sized,
    S: CheckpointStore,
{
    config.validate()?;
    let catalog = config.catalog(&request.catalog_id)?;
    if request.max_pages == 0 {
        return Err(AppError::validation("max_pages must be at least 1"));
    }
    tokio::fs::create_dir_all(&request.download_dir).await?;

    let mut checkpoints = CheckpointManager::new(store, request.max_pages);
    let start_page = checkpoints.start_page(request.resume).await?;
    let mut summary = RunSummary::new(start_page, request.max_pages);

    if start_page > request.max_pages {
        log::info!(
            "All {} requested pages are already extracted; nothing to do",
            request.max_pages
        );
        summary.outcome = RunOutcome::AlreadyComplete;
        return Ok(summary);
    }

    log::info!(
        "Extracting pages {}..={} of '{}' into {}",
        start_page,
        request.max_pages,
        catalog.id,
        request.download_dir.display()
    );

    let session = SessionController::new(browser, catalog, &config.timeouts, &config.delays)
        .login(&request.credentials)
        .await?;
    if session.reused {
        log::warn!("Continuing with an existing session on {}", session.base_url);
    }

    let detector =
        DownloadDetector::from_config(&request.download_dir, &config.timeouts, &config.workflow);
    let mut workflow = PageWorkflow::new(browser, config, catalog, detector, checkpoints);
    workflow.search().await?;

    if let Err(e) = workflow.jump_to(start_page).await {
        if e.is_fatal() {
            return Err(e);
        }
        log::error!("Could not reach page {start_page}: {e}");
        summary.outcome = RunOutcome::StoppedEarly;
        log_summary(&summary);
        return Ok(summary);
    }

    let mut page = start_page;
    loop {
        let mut task = PageTask::new(page);
        match workflow.process_page(&mut task).await {
            Ok(_) => summary.completed.push(page),
            Err(e @ AppError::PageProcessing { .. }) => {
                log::error!("{e}; skipping page {page}");
                summary.failed.push(page);
                workflow.reload_current().await;
            }
            Err(e) => return Err(e),
        }

        match workflow.advance(page, request.max_pages).await {
            Ok(Advance::Done) => break,
            Ok(Advance::Moved(next)) => page = next,
            Err(e) if !e.is_fatal() => {
                log::warn!("{e}; stopping after page {page}");
                summary.outcome = RunOutcome::StoppedEarly;
                break;
            }
            Err(e) => return Err(e),
        }
    }

    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    log::info!(
        "Run finished ({:?}): {} pages exported {:?}, {} failed {:?}",
        summary.outcome,
        summary.completed.len(),
        summary.completed,
        summary.failed.len(),
        summary.failed
    );
    if !summary.failed.is_empty() {
        log::warn!(
            "Pages {:?} have no export; a resumed run will not revisit them, rerun without --resume to retry",
            summary.failed
        );
    }
}
