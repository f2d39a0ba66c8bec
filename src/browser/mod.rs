//! Browser automation abstraction.
//!
//! The workflow only talks to a [`Browser`]; the production backend is
//! [`WebDriverBrowser`] (thirtyfour over a WebDriver server).

pub mod inspect;
pub mod webdriver;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Condition, Strategy};

// Re-export for convenience
pub use inspect::PageInspection;
pub use webdriver::WebDriverBrowser;

/// Operations the extraction workflow needs from a browser session.
///
/// Waits return `Ok(None)` when nothing matched within the budget; `Err`
/// is reserved for failures of the driver itself.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle to an element on the current page.
    type Element: Clone + Send + Sync;

    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn refresh(&self) -> Result<()>;

    async fn title(&self) -> Result<String>;

    async fn page_source(&self) -> Result<String>;

    /// Wait up to `timeout` for an element matching `strategy` and `condition`.
    async fn wait_for(
        &self,
        strategy: &Strategy,
        condition: Condition,
        timeout: Duration,
    ) -> Result<Option<Self::Element>>;

    /// All elements currently matching `strategy`, without waiting.
    async fn find_all(&self, strategy: &Strategy) -> Result<Vec<Self::Element>>;

    /// First descendant of `parent` matching `strategy`, without waiting.
    async fn find_in(
        &self,
        parent: &Self::Element,
        strategy: &Strategy,
    ) -> Result<Option<Self::Element>>;

    /// Click, falling back to a script click when the native click is intercepted.
    async fn click(&self, element: &Self::Element) -> Result<()>;

    async fn clear(&self, element: &Self::Element) -> Result<()>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<()>;

    async fn press_enter(&self, element: &Self::Element) -> Result<()>;

    async fn is_selected(&self, element: &Self::Element) -> Result<bool>;

    /// Whether `element` is still attached to the current document.
    async fn is_present(&self, element: &Self::Element) -> Result<bool>;

    /// Submit the form that owns `element`.
    async fn submit_form(&self, element: &Self::Element) -> Result<()>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;
}

/// Log the current URL, title and a summary of the page for diagnosis.
///
/// Never fails; diagnostics must not mask the error being diagnosed.
pub async fn log_page_state<B: Browser + ?Sized>(browser: &B, context: &str) {
    let url = browser.current_url().await.unwrap_or_default();
    let title = browser.title().await.unwrap_or_default();
    log::warn!("[{context}] url: {url} | title: {title}");

    match browser.page_source().await {
        Ok(html) => PageInspection::from_html(&html).log(context),
        Err(e) => log::debug!("[{context}] page source unavailable: {e}"),
    }
}
