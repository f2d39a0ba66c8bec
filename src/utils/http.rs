// src/utils/http.rs

//! WebDriver server readiness probe.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::{Instant, sleep};

use crate::error::{AppError, Result};
use crate::models::WebDriverConfig;

/// Interval between readiness probes.
const PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Body of a WebDriver `GET /status` response.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub value: StatusValue,
}

#[derive(Debug, Deserialize)]
pub struct StatusValue {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

/// Status endpoint of a WebDriver server.
pub fn status_url(base: &str) -> String {
    format!("{}/status", base.trim_end_matches('/'))
}

async fn probe(client: &reqwest::Client, url: &str) -> Result<StatusResponse> {
    Ok(client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?)
}

/// Poll the WebDriver server until it reports ready or the startup timeout elapses.
pub async fn wait_for_webdriver(config: &WebDriverConfig) -> Result<()> {
    let client = create_async_client(Duration::from_secs(5))?;
    let url = status_url(&config.url);
    let deadline = Instant::now() + Duration::from_secs(config.startup_timeout_secs);

    loop {
        match probe(&client, &url).await {
            Ok(status) if status.value.ready => {
                log::info!("WebDriver ready at {}", config.url);
                return Ok(());
            }
            Ok(status) => log::debug!("WebDriver not ready: {}", status.value.message),
            Err(e) => log::debug!("WebDriver status probe failed: {}", e),
        }

        if Instant::now() >= deadline {
            return Err(AppError::config(format!(
                "WebDriver at {} not ready after {}s",
                config.url, config.startup_timeout_secs
            )));
        }
        sleep(PROBE_INTERVAL).await;
    }
}
