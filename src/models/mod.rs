use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ── Capture source ────────────────────────────────────────────────────────────

/// How a snapshot was captured. Persisted as the `platform` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureSource {
    #[serde(rename = "webdriver")]
    WebDriver,
    #[serde(rename = "http-static")]
    HttpStatic,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::WebDriver => write!(f, "webdriver"),
            CaptureSource::HttpStatic => write!(f, "http-static"),
        }
    }
}

// ── Scrape outcome ────────────────────────────────────────────────────────────

/// What a page capture produced, before it becomes a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeOutcome {
    pub ids: BTreeSet<String>,
    pub expansions: u32,
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// One scrape result. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SnapshotRecord", from = "SnapshotRecord")]
pub struct Snapshot {
    pub ids: BTreeSet<String>,
    pub captured_at: DateTime<Utc>,
    pub expansions: u32,
    pub source: CaptureSource,
}

impl Snapshot {
    pub fn new(outcome: ScrapeOutcome, captured_at: DateTime<Utc>, source: CaptureSource) -> Self {
        Self {
            ids: outcome.ids,
            captured_at,
            expansions: outcome.expansions,
            source,
        }
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// Whole seconds since capture; zero if the clock is behind the snapshot.
    pub fn age_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.captured_at).num_seconds().max(0) as u64
    }

    pub fn record(&self) -> SnapshotRecord {
        SnapshotRecord::from(self.clone())
    }
}

/// On-disk / wire shape of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub success: bool,
    pub ids: Vec<String>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    pub clicks: u32,
    pub platform: CaptureSource,
}

impl From<Snapshot> for SnapshotRecord {
    fn from(s: Snapshot) -> Self {
        let count = s.ids.len();
        Self {
            success: true,
            ids: s.ids.into_iter().collect(),
            count,
            timestamp: s.captured_at,
            clicks: s.expansions,
            platform: s.source,
        }
    }
}

impl From<SnapshotRecord> for Snapshot {
    // `count` is derived, so a stale value in the file is ignored.
    fn from(r: SnapshotRecord) -> Self {
        Self {
            ids: r.ids.into_iter().collect(),
            captured_at: r.timestamp,
            expansions: r.clicks,
            source: r.platform,
        }
    }
}
