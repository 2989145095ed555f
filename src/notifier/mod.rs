use crate::config::NotifierConfig;
use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::time::Duration;
use tracing::{info, warn};

/// Outbound alert channel. Delivery failures never propagate.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn enabled(&self) -> bool;
    /// Returns true only when the message was confirmed delivered.
    async fn notify(&self, message: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
    username: &'a str,
}

/// Discord-style webhook: JSON `{content, username}`, 204 on success.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
    username: String,
    success_status: u16,
}

impl WebhookNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MonitorError::Config(format!("webhook client: {}", e)))?;

        let url = Some(config.webhook_url.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(Self {
            client,
            url,
            username: config.username.clone(),
            success_status: config.success_status,
        })
    }

    async fn post(&self, url: &str, message: &str) -> Result<()> {
        let payload = WebhookPayload {
            content: message,
            username: &self.username,
        };
        let resp = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::Notification(e.to_string()))?;

        let status = resp.status().as_u16();
        if status != self.success_status {
            return Err(MonitorError::Notification(format!(
                "webhook answered {} (expected {})",
                status, self.success_status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn enabled(&self) -> bool {
        self.url.is_some()
    }

    async fn notify(&self, message: &str) -> bool {
        let Some(url) = self.url.as_deref() else {
            return false;
        };
        match self.post(url, message).await {
            Ok(()) => {
                info!("Webhook notification sent");
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

fn join_ids(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Alert sent by the scheduled loop.
pub fn sold_message(sold: &BTreeSet<String>, local_time: impl Display) -> String {
    format!(
        "🎉 **{} item(s) sold!**\n\n**Sold IDs:** {}\n\nRemove these from the physical store.\nTime: {}",
        sold.len(),
        join_ids(sold),
        local_time
    )
}

/// Alert sent by a manual force-check.
pub fn test_message(sold: &BTreeSet<String>) -> String {
    format!("🧪 TEST: {} items detected as sold: {}", sold.len(), join_ids(sold))
}
