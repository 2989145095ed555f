//! Headless browser capture through a WebDriver endpoint (chromedriver,
//! geckodriver, or a Selenium grid).

use crate::config::{BrowserKind, ScraperConfig};
use crate::errors::{MonitorError, Result};
use crate::models::CaptureSource;
use async_trait::async_trait;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{PageDriver, PageSession};

pub struct WebDriverPageDriver {
    webdriver_url: String,
    browser: BrowserKind,
    load_more_selector: String,
    user_agent: String,
    settle: Duration,
}

impl WebDriverPageDriver {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            browser: config.browser,
            load_more_selector: config.load_more_selector.clone(),
            user_agent: config.user_agent.clone(),
            settle: Duration::from_millis(config.settle_ms),
        }
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert("pageLoadStrategy".to_string(), json!("normal"));
        match self.browser {
            BrowserKind::Chrome => {
                caps.insert(
                    "goog:chromeOptions".to_string(),
                    json!({
                        "args": [
                            "--headless=new",
                            "--no-sandbox",
                            "--disable-gpu",
                            "--disable-dev-shm-usage",
                            format!("--user-agent={}", self.user_agent),
                        ]
                    }),
                );
            }
            BrowserKind::Firefox => {
                caps.insert(
                    "moz:firefoxOptions".to_string(),
                    json!({
                        "args": ["-headless"],
                        "prefs": { "general.useragent.override": self.user_agent },
                    }),
                );
            }
        }
        caps
    }
}

#[async_trait]
impl PageDriver for WebDriverPageDriver {
    fn source(&self) -> CaptureSource {
        CaptureSource::WebDriver
    }

    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>> {
        info!("Connecting to WebDriver at {}", self.webdriver_url);
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| MonitorError::Fetch(format!("WebDriver session failed: {}", e)))?;

        // goto returns once the document is loaded; the settle pause covers
        // the XHR that fills the listing grid afterwards.
        if let Err(e) = client.goto(url).await {
            if let Err(close_err) = client.close().await {
                debug!("Closing session after failed navigation: {}", close_err);
            }
            return Err(MonitorError::Fetch(format!("Navigation to {} failed: {}", url, e)));
        }
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        Ok(Box::new(WebDriverSession {
            client,
            load_more_selector: self.load_more_selector.clone(),
        }))
    }
}

struct WebDriverSession {
    client: Client,
    load_more_selector: String,
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn content(&mut self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    async fn load_more_visible(&mut self) -> Result<bool> {
        let element = match self
            .client
            .find(Locator::Css(&self.load_more_selector))
            .await
        {
            Ok(el) => el,
            Err(e) if e.is_no_such_element() => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        // The grid re-renders after each load, so the handle may already be stale.
        match element.is_displayed().await {
            Ok(shown) => Ok(shown),
            Err(e) => {
                warn!("Could not query load-more visibility: {}", e);
                Ok(false)
            }
        }
    }

    async fn click_load_more(&mut self) -> Result<()> {
        let element = self
            .client
            .find(Locator::Css(&self.load_more_selector))
            .await?;
        element.click().await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
