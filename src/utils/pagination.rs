// src/utils/pagination.rs

//! Pagination URL rewriting.

use url::Url;

use crate::error::Result;
use crate::models::WorkflowConfig;

/// Rewrite `current` so that it points at `target_page` (1-based).
///
/// A page-number parameter is set directly; otherwise an offset parameter
/// is set to `(target_page - 1) * results_per_page`; otherwise the first
/// configured page parameter is appended. Other parameters are preserved.
pub fn page_url(current: &str, target_page: u32, workflow: &WorkflowConfig) -> Result<String> {
    let mut url = Url::parse(current)?;
    let target = target_page.max(1);
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    if let Some(pair) = pairs
        .iter_mut()
        .find(|(k, _)| workflow.page_params.contains(k))
    {
        pair.1 = target.to_string();
    } else if let Some(pair) = pairs
        .iter_mut()
        .find(|(k, _)| workflow.offset_params.contains(k))
    {
        let offset = u64::from(target - 1) * u64::from(workflow.results_per_page);
        pair.1 = offset.to_string();
    } else {
        let name = workflow
            .page_params
            .first()
            .map(String::as_str)
            .unwrap_or("page");
        pairs.push((name.to_string(), target.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(url.to_string())
}

/// URL of the page after `page`.
pub fn next_page_url(current: &str, page: u32, workflow: &WorkflowConfig) -> Result<String> {
    page_url(current, page.saturating_add(1), workflow)
}
