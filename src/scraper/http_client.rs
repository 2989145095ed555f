use crate::config::ScraperConfig;
use crate::errors::{MonitorError, Result};
use crate::models::CaptureSource;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use super::{PageDriver, PageSession};

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .map_err(|e| MonitorError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { inner })
    }

    /// Fetch a URL as text. No retry: a failed fetch fails the cycle.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let resp = self.inner.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MonitorError::Fetch(format!("HTTP {} from {}", status, url)));
        }
        Ok(resp.text().await?)
    }
}

// ── Static capture ────────────────────────────────────────────────────────────

/// Captures only the server-rendered first page; cannot trigger "load more".
pub struct StaticPageDriver {
    client: HttpClient,
    load_more: Selector,
}

impl StaticPageDriver {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let load_more = Selector::parse(&config.load_more_selector).map_err(|e| {
            MonitorError::Config(format!(
                "load_more_selector {:?}: {:?}",
                config.load_more_selector, e
            ))
        })?;
        Ok(Self {
            client: HttpClient::new(config)?,
            load_more,
        })
    }
}

#[async_trait]
impl PageDriver for StaticPageDriver {
    fn source(&self) -> CaptureSource {
        CaptureSource::HttpStatic
    }

    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>> {
        let html = self.client.get_text(url).await?;
        Ok(Box::new(StaticPage {
            html,
            load_more: self.load_more.clone(),
        }))
    }
}

struct StaticPage {
    html: String,
    load_more: Selector,
}

impl StaticPage {
    fn has_load_more(&self) -> bool {
        Html::parse_document(&self.html)
            .select(&self.load_more)
            .next()
            .is_some()
    }
}

#[async_trait]
impl PageSession for StaticPage {
    async fn content(&mut self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn load_more_visible(&mut self) -> Result<bool> {
        if self.has_load_more() {
            warn!("Page has a load-more control; static capture only sees the first page");
        }
        Ok(false)
    }

    async fn click_load_more(&mut self) -> Result<()> {
        Err(MonitorError::Fetch(
            "static capture cannot activate load-more".to_string(),
        ))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
