//! Monitor: the scrape → store → diff → notify → promote cycle plus the
//! shared state that the scheduler and the HTTP API both work through.
//!
//! ## Entry points
//!
//! `run_cycle()`: the scheduled cycle.
//!   1. Capture the listing page → write `current`
//!   2. Diff against `previous`; notify when something sold
//!   3. Promote `current` → `previous`
//!
//! `inventory()`: serve `current` from cache when fresh, otherwise scrape
//!   (inside business hours only). Writes `current`, never promotes.
//!
//! `force_check()`: capture + diff + test notification regardless of the
//!   time gate. Leaves `previous` alone so the scheduled loop still reports
//!   the same sales.
//!
//! Every path that writes the store holds `cycle_lock` for its whole
//! read-modify-write sequence.

use crate::clock::{BusinessHours, Clock, SystemClock, WindowState};
use crate::config::AppConfig;
use crate::diff;
use crate::errors::{MonitorError, Result};
use crate::models::{CaptureSource, Snapshot, SnapshotRecord};
use crate::notifier::{self, Notifier, WebhookNotifier};
use crate::scraper::{InventorySource, ListingScraper};
use crate::storage::SnapshotStore;
use crate::utils::Timer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const STALE_NOTE: &str = "Outside business hours - cached data";

/// Process-wide bookkeeping shown by the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeState {
    pub monitoring_active: bool,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
}

pub struct Monitor {
    config: AppConfig,
    hours: BusinessHours,
    source: Arc<dyn InventorySource>,
    store: SnapshotStore,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cycle_lock: Mutex<()>,
    runtime: RwLock<RuntimeState>,
}

impl Monitor {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn InventorySource>,
        store: SnapshotStore,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let hours = BusinessHours::from_config(&config)?;
        Ok(Self {
            config,
            hours,
            source,
            store,
            notifier,
            clock,
            cycle_lock: Mutex::new(()),
            runtime: RwLock::new(RuntimeState::default()),
        })
    }

    /// Wire up the real scraper, file store, webhook and system clock.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let source = Arc::new(ListingScraper::from_config(&config.scraper)?);
        let store = SnapshotStore::open(&config.storage.data_dir)?;
        let notifier = Arc::new(WebhookNotifier::new(&config.notifier)?);
        Self::new(config, source, store, notifier, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn hours(&self) -> &BusinessHours {
        &self.hours
    }

    #[cfg(test)]
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn platform(&self) -> CaptureSource {
        self.source.source()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn window_state(&self) -> WindowState {
        self.hours.state_at(self.clock.now())
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifier.enabled()
    }

    pub fn runtime(&self) -> RuntimeState {
        self.runtime_read().clone()
    }

    pub fn set_monitoring_active(&self, active: bool) {
        self.runtime_write().monitoring_active = active;
    }

    /// Count a cycle that died without producing a `Result` (a panic).
    pub fn record_aborted_cycle(&self, reason: String) {
        let mut rt = self.runtime_write();
        rt.last_cycle_at = Some(self.clock.now());
        rt.cycles_failed += 1;
        rt.last_error = Some(reason);
    }

    fn runtime_read(&self) -> RwLockReadGuard<'_, RuntimeState> {
        self.runtime.read().unwrap_or_else(|e| e.into_inner())
    }

    fn runtime_write(&self) -> RwLockWriteGuard<'_, RuntimeState> {
        self.runtime.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Run a store operation on the blocking pool; the files are fsynced.
    async fn on_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&SnapshotStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| MonitorError::Store(format!("store task failed: {}", e)))?
    }

    // ── Cycle steps ───────────────────────────────────────────────────────────

    /// Scrape and persist as `current`. Caller must hold `cycle_lock`.
    async fn capture(&self) -> Result<Snapshot> {
        let outcome = self.source.fetch_inventory().await?;
        let snapshot = Snapshot::new(outcome, self.clock.now(), self.source.source());
        let record = snapshot.clone();
        self.on_store(move |store| store.write(&record)).await?;
        Ok(snapshot)
    }

    /// The comparison baseline. An unreadable `previous` counts as none, so
    /// the next promotion overwrites it instead of failing every cycle.
    async fn baseline(&self) -> Option<Snapshot> {
        match self.on_store(|store| store.read_previous()).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Ignoring unreadable previous snapshot: {}", e);
                None
            }
        }
    }

    /// One scheduled cycle: capture, diff, notify, promote.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let budget = std::time::Duration::from_secs(self.config.schedule.interval_secs);
        let _t = Timer::start("scrape cycle").slow_after(budget);
        let _guard = self.cycle_lock.lock().await;

        let result = self.cycle_locked().await;

        let mut rt = self.runtime_write();
        rt.last_cycle_at = Some(self.clock.now());
        match &result {
            Ok(_) => {
                rt.cycles_completed += 1;
                rt.last_error = None;
            }
            Err(e) => {
                rt.cycles_failed += 1;
                rt.last_error = Some(e.to_string());
            }
        }
        result
    }

    async fn cycle_locked(&self) -> Result<CycleReport> {
        let snapshot = self.capture().await?;
        let previous = self.baseline().await;

        let sold = diff::sold(previous.as_ref(), &snapshot);
        let added = diff::added(previous.as_ref(), &snapshot);
        if previous.is_none() {
            info!("No previous snapshot yet; this scrape becomes the baseline");
        } else if !added.is_empty() {
            info!("{} new listing(s): {}", added.len(), join(&added));
        }

        let mut notified = false;
        if !sold.is_empty() {
            let local = self.hours.local(snapshot.captured_at).format("%H:%M:%S");
            let message = notifier::sold_message(&sold, local);
            info!("{}", message);
            notified = self.notifier.notify(&message).await;
        }

        let promoted = self.on_store(|store| store.promote()).await?;

        Ok(CycleReport {
            snapshot,
            sold,
            added,
            notified,
            promoted,
        })
    }

    // ── API operations ────────────────────────────────────────────────────────

    /// Cached `current` when fresh; otherwise a synchronous scrape inside
    /// business hours, or the last snapshot marked stale outside them.
    pub async fn inventory(&self) -> Result<InventoryView> {
        let ttl = self.config.api.cache_ttl_secs;
        let now = self.clock.now();
        let current = self.on_store(|store| store.read_current()).await?;

        if let Some(snap) = &current {
            if snap.age_secs(now) < ttl {
                debug!("Serving cached inventory ({}s old)", snap.age_secs(now));
                return Ok(self.cached_view(snap, now, None));
            }
        }

        if !self.hours.is_active(now) {
            info!("Outside business hours, using cached data");
            return match current {
                Some(snap) => Ok(self.cached_view(&snap, now, Some(STALE_NOTE))),
                None => Err(MonitorError::NoCachedData),
            };
        }

        let _guard = self.cycle_lock.lock().await;

        // Someone else may have refreshed it while we waited for the lock.
        if let Some(snap) = self.on_store(|store| store.read_current()).await? {
            let now = self.clock.now();
            if snap.age_secs(now) < ttl {
                return Ok(self.cached_view(&snap, now, None));
            }
        }

        let _t = Timer::start("on-demand scrape");
        let snapshot = self.capture().await?;
        Ok(InventoryView {
            record: snapshot.record(),
            from_cache: false,
            cache_age_seconds: None,
            note: None,
            business_hours: self.config.business_hours_label(),
        })
    }

    /// Scrape now regardless of the gate, diff, and send a test alert.
    pub async fn force_check(&self) -> Result<ForceCheckReport> {
        info!("Force check requested");
        let _t = Timer::start("force check");
        let _guard = self.cycle_lock.lock().await;

        let snapshot = self.capture().await?;
        let previous = self.baseline().await;
        let sold = diff::sold(previous.as_ref(), &snapshot);

        let notification_sent = if sold.is_empty() {
            false
        } else {
            self.notifier.notify(&notifier::test_message(&sold)).await
        };

        Ok(ForceCheckReport {
            scrape_result: snapshot.record(),
            sold_items: sold.into_iter().collect(),
            notification_sent,
        })
    }

    pub async fn status(&self) -> StatusReport {
        let now = self.clock.now();
        let rt = self.runtime();
        let mut report = StatusReport {
            platform: self.platform(),
            monitoring_active: rt.monitoring_active,
            window_state: self.hours.state_at(now),
            currently_in_hours: self.hours.is_active(now),
            interval_seconds: self.config.schedule.interval_secs,
            business_hours: self.config.business_hours_label(),
            timezone: self.hours.timezone().name().to_string(),
            notifications_enabled: self.notifier.enabled(),
            last_check: None,
            item_count: None,
            last_clicks: None,
            snapshot_age_seconds: None,
            last_cycle_at: rt.last_cycle_at,
            last_error: rt.last_error,
            cycles_completed: rt.cycles_completed,
            cycles_failed: rt.cycles_failed,
        };

        match self.on_store(|store| store.read_current()).await {
            Ok(Some(snap)) => {
                report.last_check = Some(snap.captured_at);
                report.item_count = Some(snap.count());
                report.last_clicks = Some(snap.expansions);
                report.snapshot_age_seconds = Some(snap.age_secs(now));
            }
            Ok(None) => {}
            Err(e) => warn!("Status could not read current snapshot: {}", e),
        }
        report
    }

    fn cached_view(&self, snap: &Snapshot, now: DateTime<Utc>, note: Option<&str>) -> InventoryView {
        InventoryView {
            record: snap.record(),
            from_cache: true,
            cache_age_seconds: Some(snap.age_secs(now)),
            note: note.map(str::to_string),
            business_hours: self.config.business_hours_label(),
        }
    }
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

// ── Reports ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CycleReport {
    pub snapshot: Snapshot,
    pub sold: BTreeSet<String>,
    pub added: BTreeSet<String>,
    pub notified: bool,
    pub promoted: bool,
}

#[derive(Debug, Serialize)]
pub struct InventoryView {
    #[serde(flatten)]
    pub record: SnapshotRecord,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub business_hours: String,
}

#[derive(Debug, Serialize)]
pub struct ForceCheckReport {
    pub scrape_result: SnapshotRecord,
    pub sold_items: Vec<String>,
    pub notification_sent: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub platform: CaptureSource,
    pub monitoring_active: bool,
    pub window_state: WindowState,
    pub currently_in_hours: bool,
    pub interval_seconds: u64,
    pub business_hours: String,
    pub timezone: String,
    pub notifications_enabled: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub item_count: Option<usize>,
    pub last_clicks: Option<u32>,
    pub snapshot_age_seconds: Option<u64>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::tests::{helsinki, FixedClock};
    use crate::models::ScrapeOutcome;
    use crate::notifier::tests::RecordingNotifier;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    /// Hands out scripted id sets, one per fetch.
    #[derive(Default)]
    pub(crate) struct ScriptedSource {
        results: std::sync::Mutex<VecDeque<Result<ScrapeOutcome>>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn with(ids: &[&[&str]]) -> Self {
            let src = Self::default();
            for set in ids {
                src.push_ids(set);
            }
            src
        }

        pub fn push_ids(&self, ids: &[&str]) {
            self.results.lock().unwrap().push_back(Ok(ScrapeOutcome {
                ids: ids.iter().map(|s| s.to_string()).collect(),
                expansions: 2,
            }));
        }

        pub fn push_err(&self, msg: &str) {
            self.results
                .lock()
                .unwrap()
                .push_back(Err(MonitorError::Fetch(msg.to_string())));
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InventorySource for ScriptedSource {
        fn source(&self) -> CaptureSource {
            CaptureSource::WebDriver
        }

        async fn fetch_inventory(&self) -> Result<ScrapeOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MonitorError::Fetch("no scripted result".into())))
        }
    }

    pub(crate) struct Harness {
        pub monitor: Arc<Monitor>,
        pub source: Arc<ScriptedSource>,
        pub notifier: Arc<RecordingNotifier>,
        pub clock: Arc<FixedClock>,
        _dir: TempDir,
    }

    /// Monitor over a temp dir, opened at 13:00 Helsinki (inside 12-19).
    pub(crate) fn harness(source: ScriptedSource) -> Harness {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();

        let source = Arc::new(source);
        let notifier = Arc::new(RecordingNotifier::delivering());
        let clock = Arc::new(FixedClock::at(helsinki(2026, 1, 15, 13, 0)));
        let store = SnapshotStore::open(dir.path()).unwrap();

        let monitor = Monitor::new(
            config,
            source.clone(),
            store,
            notifier.clone(),
            clock.clone(),
        )
        .unwrap();

        Harness {
            monitor: Arc::new(monitor),
            source,
            notifier,
            clock,
            _dir: dir,
        }
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_cycle_is_baseline() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002"]]));
        let report = h.monitor.run_cycle().await.unwrap();

        assert!(report.sold.is_empty());
        assert!(!report.notified);
        assert!(report.promoted);
        assert!(h.notifier.messages().is_empty());
        assert_eq!(h.monitor.store().read_previous().unwrap().unwrap().ids, set(&["1001", "1002"]));
    }

    #[tokio::test]
    async fn test_sold_item_triggers_single_notification() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002", "1003"], &["1001", "1003"]]));
        h.monitor.run_cycle().await.unwrap();
        h.clock.set(helsinki(2026, 1, 15, 13, 5));

        let report = h.monitor.run_cycle().await.unwrap();
        assert_eq!(report.sold, set(&["1002"]));
        assert!(report.notified);

        let sent = h.notifier.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("1002"));
        assert!(sent[0].contains("Time: 13:05:00"));

        // baseline moved forward, so the sale is reported only once
        let previous = h.monitor.store().read_previous().unwrap().unwrap();
        assert_eq!(previous.ids, set(&["1001", "1003"]));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_store_and_counts_failure() {
        let source = ScriptedSource::with(&[&["1001"]]);
        source.push_err("browser crashed");
        let h = harness(source);

        h.monitor.run_cycle().await.unwrap();
        let err = h.monitor.run_cycle().await.unwrap_err();
        assert!(matches!(err, MonitorError::Fetch(_)));

        let rt = h.monitor.runtime();
        assert_eq!(rt.cycles_completed, 1);
        assert_eq!(rt.cycles_failed, 1);
        assert!(rt.last_error.unwrap().contains("browser crashed"));
        assert_eq!(h.monitor.store().read_current().unwrap().unwrap().ids, set(&["1001"]));
    }

    #[tokio::test]
    async fn test_disabled_notifier_does_not_block_promotion() {
        let mut h = harness(ScriptedSource::with(&[&["1001", "1002"], &["1001"]]));
        let quiet = Arc::new(RecordingNotifier::default());
        let monitor = Monitor::new(
            h.monitor.config().clone(),
            h.source.clone(),
            h.monitor.store().clone(),
            quiet.clone(),
            h.clock.clone(),
        )
        .unwrap();
        h.monitor = Arc::new(monitor);

        h.monitor.run_cycle().await.unwrap();
        let report = h.monitor.run_cycle().await.unwrap();
        assert_eq!(report.sold, set(&["1002"]));
        assert!(!report.notified);
        assert!(report.promoted);
    }

    /// A previous file in a shape this build cannot read (naive timestamp,
    /// unknown platform) cut short mid-write.
    const FOREIGN_PREVIOUS: &str =
        r#"{"success": true, "ids": ["1001", "1002"], "count": 2, "timestamp": "2025-06-01T14:00:00.123456", "clicks": 3, "platform": "render-playwright""#;

    #[tokio::test]
    async fn test_unreadable_previous_is_replaced_by_next_cycle() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002"], &["1001"]]));
        std::fs::write(h.monitor.store().previous_path(), FOREIGN_PREVIOUS).unwrap();

        let first = h.monitor.run_cycle().await.unwrap();
        assert!(first.sold.is_empty());
        assert!(first.promoted);
        assert!(h.notifier.messages().is_empty());
        let previous = h.monitor.store().read_previous().unwrap().unwrap();
        assert_eq!(previous.ids, set(&["1001", "1002"]));

        // recovered: the following cycle diffs against the rewritten baseline
        let second = h.monitor.run_cycle().await.unwrap();
        assert_eq!(second.sold, set(&["1002"]));

        let rt = h.monitor.runtime();
        assert_eq!(rt.cycles_completed, 2);
        assert_eq!(rt.cycles_failed, 0);
    }

    #[tokio::test]
    async fn test_force_check_tolerates_unreadable_previous() {
        let h = harness(ScriptedSource::with(&[&["1001"]]));
        std::fs::write(h.monitor.store().previous_path(), "{not json").unwrap();

        let report = h.monitor.force_check().await.unwrap();
        assert!(report.sold_items.is_empty());
        assert!(!report.notification_sent);
        assert_eq!(report.scrape_result.ids, vec!["1001"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_store_errors_surface_from_blocking_pool() {
        let h = harness(ScriptedSource::default());
        std::fs::write(h.monitor.store().current_path(), "{not json").unwrap();

        let err = h.monitor.inventory().await.unwrap_err();
        assert!(matches!(err, MonitorError::Store(_)));
        assert_eq!(h.source.calls(), 0);

        // status degrades to "no snapshot" instead of failing
        assert_eq!(h.monitor.status().await.item_count, None);
    }

    #[tokio::test]
    async fn test_inventory_served_from_fresh_cache() {
        let h = harness(ScriptedSource::with(&[&["1001"]]));
        h.monitor.run_cycle().await.unwrap();
        h.clock.set(helsinki(2026, 1, 15, 13, 2));

        let view = h.monitor.inventory().await.unwrap();
        assert!(view.from_cache);
        assert_eq!(view.cache_age_seconds, Some(120));
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_inventory_rescrapes_stale_cache_in_hours() {
        let h = harness(ScriptedSource::with(&[&["1001"], &["1001", "1005"]]));
        h.monitor.run_cycle().await.unwrap();
        h.clock.set(helsinki(2026, 1, 15, 13, 10));

        let view = h.monitor.inventory().await.unwrap();
        assert!(!view.from_cache);
        assert_eq!(view.record.ids, vec!["1001", "1005"]);
        assert_eq!(h.source.calls(), 2);

        // an on-demand scrape never moves the baseline
        let previous = h.monitor.store().read_previous().unwrap().unwrap();
        assert_eq!(previous.ids, set(&["1001"]));
    }

    #[tokio::test]
    async fn test_inventory_outside_hours_without_data() {
        let h = harness(ScriptedSource::default());
        h.clock.set(helsinki(2026, 1, 15, 21, 0));

        let err = h.monitor.inventory().await.unwrap_err();
        assert!(matches!(err, MonitorError::NoCachedData));
        assert_eq!(h.source.calls(), 0);
    }

    #[tokio::test]
    async fn test_inventory_outside_hours_returns_stale_snapshot() {
        let h = harness(ScriptedSource::with(&[&["1001"]]));
        h.monitor.run_cycle().await.unwrap();
        h.clock.set(helsinki(2026, 1, 15, 20, 0));

        let view = h.monitor.inventory().await.unwrap();
        assert!(view.from_cache);
        assert_eq!(view.cache_age_seconds, Some(7 * 3600));
        assert_eq!(view.note.as_deref(), Some(STALE_NOTE));
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_check_without_sales_sends_nothing() {
        let h = harness(ScriptedSource::with(&[&["1001"], &["1001", "1002"]]));
        h.monitor.run_cycle().await.unwrap();

        let report = h.monitor.force_check().await.unwrap();
        assert!(report.sold_items.is_empty());
        assert!(!report.notification_sent);
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_force_check_ignores_gate_and_keeps_baseline() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002"], &["1001"]]));
        h.monitor.run_cycle().await.unwrap();
        h.clock.set(helsinki(2026, 1, 15, 23, 30));

        let report = h.monitor.force_check().await.unwrap();
        assert_eq!(report.sold_items, vec!["1002"]);
        assert!(report.notification_sent);
        assert!(h.notifier.messages()[0].starts_with("🧪 TEST: 1 items"));

        let previous = h.monitor.store().read_previous().unwrap().unwrap();
        assert_eq!(previous.ids, set(&["1001", "1002"]));
    }

    #[tokio::test]
    async fn test_concurrent_cycles_do_not_interleave() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002"], &["1001"], &["1001"]]));
        h.monitor.run_cycle().await.unwrap();

        let a = tokio::spawn({
            let m = h.monitor.clone();
            async move { m.run_cycle().await }
        });
        let b = tokio::spawn({
            let m = h.monitor.clone();
            async move { m.force_check().await }
        });
        let cycle = a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Force-check never promotes, so in either order the scheduled cycle
        // compares against the original baseline and then moves it.
        assert_eq!(cycle.sold, set(&["1002"]));
        assert_eq!(h.source.calls(), 3);
        let previous = h.monitor.store().read_previous().unwrap().unwrap();
        assert_eq!(previous.ids, set(&["1001"]));
    }

    #[tokio::test]
    async fn test_status_reports_last_snapshot() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002"]]));
        let before = h.monitor.status().await;
        assert_eq!(before.item_count, None);
        assert_eq!(before.window_state, WindowState::ActiveWindow);

        h.monitor.run_cycle().await.unwrap();
        h.monitor.set_monitoring_active(true);
        h.clock.set(helsinki(2026, 1, 15, 13, 1));

        let status = h.monitor.status().await;
        assert!(status.monitoring_active);
        assert_eq!(status.item_count, Some(2));
        assert_eq!(status.last_clicks, Some(2));
        assert_eq!(status.snapshot_age_seconds, Some(60));
        assert_eq!(status.timezone, "Europe/Helsinki");
        assert_eq!(status.cycles_completed, 1);
    }
}
