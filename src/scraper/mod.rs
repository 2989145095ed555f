pub mod extractor;
pub mod http_client;
pub mod webdriver;

use crate::config::{DriverKind, ScraperConfig};
use crate::errors::{MonitorError, Result};
use crate::models::{CaptureSource, ScrapeOutcome};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use self::extractor::IdExtractor;
use self::http_client::StaticPageDriver;
use self::webdriver::WebDriverPageDriver;

// ── Browser capability ────────────────────────────────────────────────────────

/// One loaded page. Implementations own whatever browser/HTTP state they need.
#[async_trait]
pub trait PageSession: Send {
    /// Current rendered markup.
    async fn content(&mut self) -> Result<String>;
    /// Whether the "load more" control is present and visible.
    async fn load_more_visible(&mut self) -> Result<bool>;
    async fn click_load_more(&mut self) -> Result<()>;
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Swappable page loader.
#[async_trait]
pub trait PageDriver: Send + Sync {
    fn source(&self) -> CaptureSource;
    /// Load `url` and wait until the document has settled.
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>>;
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// What the monitor needs from a scraper: the currently listed ids.
#[async_trait]
pub trait InventorySource: Send + Sync {
    fn source(&self) -> CaptureSource;
    async fn fetch_inventory(&self) -> Result<ScrapeOutcome>;
}

// ── Listing scraper ───────────────────────────────────────────────────────────

pub struct ListingScraper {
    driver: Box<dyn PageDriver>,
    extractor: IdExtractor,
    target_url: String,
    max_expansions: u32,
    expansion_pause: Duration,
    op_timeout: Duration,
}

impl ListingScraper {
    pub fn new(config: &ScraperConfig, driver: Box<dyn PageDriver>) -> Result<Self> {
        Ok(Self {
            driver,
            extractor: IdExtractor::new(&config.id_pattern)?,
            target_url: config.target_url.clone(),
            max_expansions: config.max_expansions,
            expansion_pause: Duration::from_millis(config.expansion_pause_ms),
            op_timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Build the scraper with the driver named in the config.
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        let driver: Box<dyn PageDriver> = match config.driver {
            DriverKind::Webdriver => Box::new(WebDriverPageDriver::new(config)),
            DriverKind::Http => Box::new(StaticPageDriver::new(config)?),
        };
        info!(
            "Using {} driver for {} (max {} expansions)",
            driver.source(),
            config.target_url,
            config.max_expansions
        );
        Self::new(config, driver)
    }

    /// Click "load more" until it disappears or the limit is hit, collecting
    /// ids from every intermediate state of the page.
    async fn expand(&self, session: &mut Box<dyn PageSession>) -> Result<ScrapeOutcome> {
        let mut ids = BTreeSet::new();
        let mut expansions = 0u32;
        let mut exhausted = false;

        while expansions < self.max_expansions {
            let html = bounded(self.op_timeout, "read page content", session.content()).await?;
            let added = self.extractor.extract_into(&html, &mut ids);
            debug!("Expansion {}: +{} items (total: {})", expansions, added, ids.len());

            let visible =
                bounded(self.op_timeout, "locate load-more control", session.load_more_visible())
                    .await?;
            if !visible {
                debug!("Load-more control not visible, all items loaded");
                exhausted = true;
                break;
            }

            if let Err(e) =
                bounded(self.op_timeout, "activate load-more control", session.click_load_more())
                    .await
            {
                warn!("Load-more activation failed, treating as fully loaded: {}", e);
                exhausted = true;
                break;
            }
            expansions += 1;

            if !self.expansion_pause.is_zero() {
                tokio::time::sleep(self.expansion_pause).await;
            }
        }

        if !exhausted {
            warn!("Reached expansion limit ({}), stopping", self.max_expansions);
        }

        let html = bounded(self.op_timeout, "read final page content", session.content()).await?;
        self.extractor.extract_into(&html, &mut ids);

        Ok(ScrapeOutcome { ids, expansions })
    }
}

#[async_trait]
impl InventorySource for ListingScraper {
    fn source(&self) -> CaptureSource {
        self.driver.source()
    }

    async fn fetch_inventory(&self) -> Result<ScrapeOutcome> {
        info!("Loading {}", self.target_url);
        let mut session =
            bounded(self.op_timeout, "open page", self.driver.open(&self.target_url)).await?;

        let outcome = self.expand(&mut session).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close page session: {}", e);
        }

        let outcome = outcome?;
        info!(
            "Scrape complete: {} items found ({} expansions)",
            outcome.ids.len(),
            outcome.expansions
        );
        Ok(outcome)
    }
}

/// Run one browser/network step with an upper time bound.
async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(MonitorError::Fetch(format!("{} timed out after {:?}", what, limit))),
    }
}
