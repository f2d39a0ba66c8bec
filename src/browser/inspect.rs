//! Page inspection for failure diagnostics.
//!
//! Summarises what a page actually offers when a locator chain comes up
//! empty, so selector drift can be diagnosed from the log alone.

use scraper::{Html, Selector};

/// Keywords that mark an export-related control.
const EXPORT_KEYWORDS: [&str; 4] = ["export", "download", "cite", "citation"];

/// Upper bound on listed items per category.
const MAX_LISTED: usize = 10;

/// Summary of the interactive elements on a page.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageInspection {
    pub checkboxes: usize,
    pub buttons: usize,
    /// Texts of buttons and links that look export-related
    pub export_controls: Vec<String>,
    /// Texts or hrefs of links that look like pagination
    pub pagination_links: Vec<String>,
}

impl PageInspection {
    /// Inspect raw page HTML.
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut inspection = Self::default();

        if let Ok(sel) = Selector::parse("input[type='checkbox']") {
            inspection.checkboxes = document.select(&sel).count();
        }

        if let Ok(sel) = Selector::parse("button") {
            inspection.buttons = document.select(&sel).count();
        }

        if let Ok(sel) = Selector::parse("button, a") {
            inspection.export_controls = document
                .select(&sel)
                .map(|el| normalize(&el.text().collect::<String>()))
                .filter(|text| {
                    let lower = text.to_lowercase();
                    EXPORT_KEYWORDS.iter().any(|k| lower.contains(k))
                })
                .take(MAX_LISTED)
                .collect();
        }

        if let Ok(sel) = Selector::parse("a") {
            inspection.pagination_links = document
                .select(&sel)
                .filter_map(|el| {
                    let text = normalize(&el.text().collect::<String>());
                    let href = el.value().attr("href").unwrap_or("");
                    let class = el.value().attr("class").unwrap_or("");
                    let looks_like_pagination = href.contains("page=")
                        || href.contains("offset=")
                        || class.contains("next")
                        || class.contains("pagination")
                        || text.to_lowercase().starts_with("next");
                    looks_like_pagination.then(|| {
                        if text.is_empty() {
                            href.to_string()
                        } else {
                            text
                        }
                    })
                })
                .take(MAX_LISTED)
                .collect();
        }

        inspection
    }

    /// Write the summary to the log.
    pub fn log(&self, context: &str) {
        log::warn!(
            "[{context}] page has {} checkboxes, {} buttons",
            self.checkboxes,
            self.buttons
        );
        if self.export_controls.is_empty() {
            log::warn!("[{context}] no export-related controls on page");
        } else {
            log::warn!(
                "[{context}] export-related controls: {}",
                self.export_controls.join(" | ")
            );
        }
        if !self.pagination_links.is_empty() {
            log::warn!(
                "[{context}] pagination links: {}",
                self.pagination_links.join(" | ")
            );
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="results-header">
            <input type="checkbox" id="srp-select-all">
            <button class="export-button">  Export
              citations </button>
            <button>Save search</button>
          </div>
          <ol id="srp-results-list">
            <li class="ResultItem"><input type="checkbox"><a href="/science/article/1">Paper one</a></li>
            <li class="ResultItem"><input type="checkbox"><a href="/science/article/2">Paper two</a></li>
          </ol>
          <a href="/search?qs=ai&offset=25">2</a>
          <a class="next-link" href="/search?qs=ai&offset=25">next</a>
          <a href="/help">Download the app</a>
        </body></html>
    "#;

    #[test]
    fn counts_interactive_elements() {
        let inspection = PageInspection::from_html(RESULTS_PAGE);
        assert_eq!(inspection.checkboxes, 3);
        assert_eq!(inspection.buttons, 2);
    }

    #[test]
    fn lists_export_controls_with_normalized_text() {
        let inspection = PageInspection::from_html(RESULTS_PAGE);
        assert_eq!(
            inspection.export_controls,
            vec!["Export citations".to_string(), "Download the app".to_string()]
        );
    }

    #[test]
    fn lists_pagination_links() {
        let inspection = PageInspection::from_html(RESULTS_PAGE);
        assert_eq!(
            inspection.pagination_links,
            vec!["2".to_string(), "next".to_string()]
        );
    }

    #[test]
    fn empty_page_yields_empty_summary() {
        assert_eq!(PageInspection::from_html(""), PageInspection::default());
    }
}
