use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Browser or network failure while capturing the listing page.
    #[error("Scrape failed: {0}")]
    Fetch(String),

    /// Inventory requested outside the active window before any snapshot exists.
    #[error("No cached data available")]
    NoCachedData,

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Snapshot store error: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MonitorError {
    /// Stable machine-readable tag used in API error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::Fetch(_) => "fetch_failure",
            MonitorError::NoCachedData => "no_cached_data",
            MonitorError::Notification(_) => "notification_failure",
            MonitorError::Store(_) => "store_failure",
            MonitorError::Config(_) => "config_error",
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::Fetch(err.to_string())
    }
}

impl From<fantoccini::error::CmdError> for MonitorError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        MonitorError::Fetch(err.to_string())
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(MonitorError::NoCachedData.kind(), "no_cached_data");
        assert_eq!(MonitorError::Fetch("x".into()).kind(), "fetch_failure");
        assert_eq!(
            MonitorError::Store("disk full".into()).to_string(),
            "Snapshot store error: disk full"
        );
    }
}
