use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::MonitorError;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// How the listing page is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Headless browser through a WebDriver endpoint; supports "load more".
    Webdriver,
    /// Plain GET of the first page only.
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_target_url")]
    pub target_url: String,

    #[serde(default = "default_driver")]
    pub driver: DriverKind,

    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_browser")]
    pub browser: BrowserKind,

    #[serde(default = "default_load_more_selector")]
    pub load_more_selector: String,

    /// Regex whose first capture group (or whole match) is an item id.
    #[serde(default = "default_id_pattern")]
    pub id_pattern: String,

    #[serde(default = "default_max_expansions")]
    pub max_expansions: u32,

    #[serde(default = "default_expansion_pause_ms")]
    pub expansion_pause_ms: u64,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Time gate and loop pacing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_business_start")]
    pub business_start: u32,

    #[serde(default = "default_business_end")]
    pub business_end: u32,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,

    #[serde(default = "default_max_quiet_sleep_secs")]
    pub max_quiet_sleep_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Outbound webhook; an empty URL disables notifications.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub webhook_url: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_success_status")]
    pub success_status: u16,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_target_url() -> String {
    "https://trashion.fi".to_string()
}
fn default_driver() -> DriverKind {
    DriverKind::Webdriver
}
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}
fn default_browser() -> BrowserKind {
    BrowserKind::Chrome
}
fn default_load_more_selector() -> String {
    ".wpgb-load-more".to_string()
}
fn default_id_pattern() -> String {
    r"\((\d{4})\)".to_string()
}
fn default_max_expansions() -> u32 {
    20
}
fn default_expansion_pause_ms() -> u64 {
    2000
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "listing-monitor/0.1 (inventory change tracker)".to_string()
}
fn default_interval_secs() -> u64 {
    300
}
fn default_business_start() -> u32 {
    12
}
fn default_business_end() -> u32 {
    19
}
fn default_timezone() -> String {
    "Europe/Helsinki".to_string()
}
fn default_error_backoff_secs() -> u64 {
    60
}
fn default_max_quiet_sleep_secs() -> u64 {
    3600
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_username() -> String {
    "Inventory Monitor".to_string()
}
fn default_notify_timeout_secs() -> u64 {
    10
}
fn default_success_status() -> u16 {
    204
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            driver: default_driver(),
            webdriver_url: default_webdriver_url(),
            browser: default_browser(),
            load_more_selector: default_load_more_selector(),
            id_pattern: default_id_pattern(),
            max_expansions: default_max_expansions(),
            expansion_pause_ms: default_expansion_pause_ms(),
            settle_ms: default_settle_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            business_start: default_business_start(),
            business_end: default_business_end(),
            timezone: default_timezone(),
            error_backoff_secs: default_error_backoff_secs(),
            max_quiet_sleep_secs: default_max_quiet_sleep_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            username: default_username(),
            timeout_secs: default_notify_timeout_secs(),
            success_status: default_success_status(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("MONITOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        let app_cfg: AppConfig = cfg
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        Ok(app_cfg)
    }

    pub fn notifications_enabled(&self) -> bool {
        !self.notifier.webhook_url.trim().is_empty()
    }

    pub fn timezone(&self) -> std::result::Result<Tz, MonitorError> {
        self.schedule
            .timezone
            .parse::<Tz>()
            .map_err(|e| MonitorError::Config(format!("timezone {:?}: {}", self.schedule.timezone, e)))
    }

    /// "12:00-19:00" as reported by the API.
    pub fn business_hours_label(&self) -> String {
        format!(
            "{}:00-{}:00",
            self.schedule.business_start, self.schedule.business_end
        )
    }

    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> std::result::Result<(), MonitorError> {
        let s = &self.schedule;
        if s.business_start >= s.business_end || s.business_end > 24 {
            return Err(MonitorError::Config(format!(
                "business hours must satisfy 0 <= start < end <= 24 (got {}..{})",
                s.business_start, s.business_end
            )));
        }
        if s.interval_secs == 0 {
            return Err(MonitorError::Config("interval_secs must be > 0".into()));
        }
        self.timezone()?;

        regex::Regex::new(&self.scraper.id_pattern)
            .map_err(|e| MonitorError::Config(format!("id_pattern: {}", e)))?;
        url::Url::parse(&self.scraper.target_url)
            .map_err(|e| MonitorError::Config(format!("target_url: {}", e)))?;
        if self.scraper.driver == DriverKind::Webdriver {
            url::Url::parse(&self.scraper.webdriver_url)
                .map_err(|e| MonitorError::Config(format!("webdriver_url: {}", e)))?;
        }
        if self.notifications_enabled() {
            url::Url::parse(self.notifier.webhook_url.trim())
                .map_err(|e| MonitorError::Config(format!("webhook_url: {}", e)))?;
        }
        Ok(())
    }
}
