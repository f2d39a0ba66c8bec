// src/services/locator.rs

//! Ordered-fallback element resolution.

use std::time::Duration;

use crate::browser::Browser;
use crate::error::{AppError, Result};
use crate::models::{LocatorSpec, Strategy};

/// An element found by a locator, with the strategy that matched.
#[derive(Debug, Clone)]
pub struct Resolved<E> {
    pub element: E,
    pub strategy: Strategy,
    /// Position of the matching strategy in the chain
    pub index: usize,
}

/// Resolves [`LocatorSpec`]s against a browser, trying strategies in order.
pub struct LocatorResolver<'a, B: Browser + ?Sized> {
    browser: &'a B,
}

impl<'a, B: Browser + ?Sized> LocatorResolver<'a, B> {
    pub fn new(browser: &'a B) -> Self {
        Self { browser }
    }

    /// Resolve the first strategy that yields an element within `per_strategy`.
    ///
    /// Strategies after the first match are never evaluated. When every
    /// strategy fails the error lists all of them in the order tried.
    pub async fn resolve(
        &self,
        spec: &LocatorSpec,
        per_strategy: Duration,
    ) -> Result<Resolved<B::Element>> {
        let mut tried = Vec::with_capacity(spec.strategies.len());

        for (index, strategy) in spec.strategies.iter().enumerate() {
            match self
                .browser
                .wait_for(strategy, spec.condition, per_strategy)
                .await
            {
                Ok(Some(element)) => {
                    log::info!("[{}] found with {}", spec.target, strategy);
                    return Ok(Resolved {
                        element,
                        strategy: strategy.clone(),
                        index,
                    });
                }
                Ok(None) => {
                    log::debug!("[{}] no match for {}", spec.target, strategy);
                }
                Err(e) => {
                    log::debug!("[{}] {} failed: {}", spec.target, strategy, e);
                }
            }
            tried.push(strategy.to_string());
        }

        log::warn!(
            "[{}] all {} strategies failed",
            spec.target,
            spec.strategies.len()
        );
        Err(AppError::locator_not_found(&spec.target, tried))
    }

    /// All elements matched by the first strategy that matches any.
    pub async fn find_all(&self, spec: &LocatorSpec) -> Result<Vec<B::Element>> {
        for strategy in &spec.strategies {
            match self.browser.find_all(strategy).await {
                Ok(elements) if !elements.is_empty() => {
                    log::debug!(
                        "[{}] {} elements with {}",
                        spec.target,
                        elements.len(),
                        strategy
                    );
                    return Ok(elements);
                }
                Ok(_) => {}
                Err(e) => log::debug!("[{}] {} failed: {}", spec.target, strategy, e),
            }
        }
        Ok(Vec::new())
    }

    /// First descendant of `parent` matched by any strategy, in order.
    pub async fn find_in(
        &self,
        parent: &B::Element,
        spec: &LocatorSpec,
    ) -> Result<Option<B::Element>> {
        for strategy in &spec.strategies {
            match self.browser.find_in(parent, strategy).await {
                Ok(Some(element)) => return Ok(Some(element)),
                Ok(None) => {}
                Err(e) => log::debug!("[{}] {} failed: {}", spec.target, strategy, e),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeBrowser, Role};
    use crate::models::Condition;

    fn chain() -> LocatorSpec {
        LocatorSpec::new(
            "export_button",
            Condition::Clickable,
            vec![
                Strategy::css("button.a"),
                Strategy::xpath("//button[@id='b']"),
                Strategy::id("c"),
            ],
        )
    }

    #[tokio::test]
    async fn stops_at_first_matching_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FakeBrowser::empty(dir.path());
        browser.register(Strategy::xpath("//button[@id='b']"), Role::Other);
        browser.register(Strategy::id("c"), Role::Other);

        let resolved = LocatorResolver::new(&browser)
            .resolve(&chain(), Duration::from_millis(10))
            .await
            .unwrap();

        assert_eq!(resolved.index, 1);
        assert_eq!(resolved.strategy, Strategy::xpath("//button[@id='b']"));
        // C is never evaluated
        assert_eq!(
            browser.state().tried,
            vec![Strategy::css("button.a"), Strategy::xpath("//button[@id='b']")]
        );
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_strategy_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FakeBrowser::empty(dir.path());

        let err = LocatorResolver::new(&browser)
            .resolve(&chain(), Duration::from_millis(10))
            .await
            .unwrap_err();

        match err {
            AppError::LocatorNotFound { target, tried } => {
                assert_eq!(target, "export_button");
                assert_eq!(
                    tried,
                    vec![
                        "css: button.a".to_string(),
                        "xpath: //button[@id='b']".to_string(),
                        "id: c".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_chain_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FakeBrowser::empty(dir.path());
        let spec = LocatorSpec::new("nothing", Condition::Present, Vec::new());

        let err = LocatorResolver::new(&browser)
            .resolve(&spec, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LocatorNotFound { tried, .. } if tried.is_empty()));
    }

    #[tokio::test]
    async fn find_all_returns_empty_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FakeBrowser::empty(dir.path());
        let elements = LocatorResolver::new(&browser)
            .find_all(&chain())
            .await
            .unwrap();
        assert!(elements.is_empty());
    }
}
