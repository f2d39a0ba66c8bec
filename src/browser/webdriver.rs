// src/browser/webdriver.rs

//! WebDriver backend built on thirtyfour.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thirtyfour::error::{WebDriverError, WebDriverErrorInner};
use thirtyfour::prelude::*;

use super::Browser;
use crate::error::Result;
use crate::models::{Condition, Strategy, WebDriverConfig};

/// Interval between element polls during a wait.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A Chrome session driven through a WebDriver server.
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Start a browser session that saves downloads into `download_dir`.
    pub async fn connect(config: &WebDriverConfig, download_dir: &Path) -> Result<Self> {
        let download_dir = std::path::absolute(download_dir)?;

        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.set_headless()?;
        }
        for arg in &config.args {
            caps.add_arg(arg)?;
        }
        caps.add_experimental_option(
            "prefs",
            json!({
                "download.default_directory": download_dir.to_string_lossy(),
                "download.prompt_for_download": false,
                "download.directory_upgrade": true,
                "safebrowsing.enabled": true,
            }),
        )?;

        log::info!(
            "Connecting to WebDriver at {} (downloads: {})",
            config.url,
            download_dir.display()
        );
        let driver = WebDriver::new(&config.url, caps).await?;
        Ok(Self { driver })
    }

    /// End the browser session.
    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await?;
        Ok(())
    }
}

fn by(strategy: &Strategy) -> By {
    match strategy {
        Strategy::Id(v) => By::Id(v.clone()),
        Strategy::Name(v) => By::Name(v.clone()),
        Strategy::Css(v) => By::Css(v.clone()),
        Strategy::Xpath(v) => By::XPath(v.clone()),
        Strategy::ClassName(v) => By::ClassName(v.clone()),
        Strategy::LinkText(v) => By::LinkText(v.clone()),
    }
}

/// Errors that only mean "nothing matched".
fn is_not_found(error: &WebDriverError) -> bool {
    matches!(
        error.as_inner(),
        WebDriverErrorInner::NoSuchElement(_)
            | WebDriverErrorInner::Timeout(_)
            | WebDriverErrorInner::StaleElementReference(_)
    )
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn refresh(&self) -> Result<()> {
        self.driver.refresh().await?;
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.driver.title().await?)
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }

    async fn wait_for(
        &self,
        strategy: &Strategy,
        condition: Condition,
        timeout: Duration,
    ) -> Result<Option<WebElement>> {
        let query = self.driver.query(by(strategy)).wait(timeout, POLL_INTERVAL);
        let query = match condition {
            Condition::Present => query,
            Condition::Visible => query.and_displayed(),
            Condition::Clickable => query.and_clickable(),
        };

        match query.first().await {
            Ok(element) => Ok(Some(element)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_all(&self, strategy: &Strategy) -> Result<Vec<WebElement>> {
        Ok(self.driver.find_all(by(strategy)).await?)
    }

    async fn find_in(&self, parent: &WebElement, strategy: &Strategy) -> Result<Option<WebElement>> {
        match parent.find(by(strategy)).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn click(&self, element: &WebElement) -> Result<()> {
        if let Err(e) = element.click().await {
            log::debug!("Native click failed ({e}); using script click");
            self.driver
                .execute("arguments[0].click();", vec![element.to_json()?])
                .await?;
        }
        Ok(())
    }

    async fn clear(&self, element: &WebElement) -> Result<()> {
        element.clear().await?;
        Ok(())
    }

    async fn send_keys(&self, element: &WebElement, text: &str) -> Result<()> {
        element.send_keys(text).await?;
        Ok(())
    }

    async fn press_enter(&self, element: &WebElement) -> Result<()> {
        element.send_keys(Key::Enter).await?;
        Ok(())
    }

    async fn is_selected(&self, element: &WebElement) -> Result<bool> {
        Ok(element.is_selected().await?)
    }

    async fn is_present(&self, element: &WebElement) -> Result<bool> {
        Ok(element.is_present().await?)
    }

    async fn submit_form(&self, element: &WebElement) -> Result<()> {
        self.driver
            .execute("arguments[0].form.submit();", vec![element.to_json()?])
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &WebElement) -> Result<()> {
        self.driver
            .execute(
                "arguments[0].scrollIntoView({block: 'center'});",
                vec![element.to_json()?],
            )
            .await?;
        Ok(())
    }
}
