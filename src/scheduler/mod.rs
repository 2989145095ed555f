//! Time-gated background loop. Never exits: failures back off and retry.

use crate::pipeline::Monitor;
use crate::utils::fmt_duration;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Floor for quiet-window sleeps so a clock exactly at the boundary cannot spin.
const MIN_QUIET_SLEEP: Duration = Duration::from_secs(1);

pub struct Scheduler {
    monitor: Arc<Monitor>,
    interval: Duration,
    error_backoff: Duration,
    max_quiet_sleep: Duration,
}

impl Scheduler {
    pub fn new(monitor: Arc<Monitor>) -> Self {
        let schedule = &monitor.config().schedule;
        let interval = Duration::from_secs(schedule.interval_secs);
        let error_backoff = Duration::from_secs(schedule.error_backoff_secs);
        let max_quiet_sleep = Duration::from_secs(schedule.max_quiet_sleep_secs).max(MIN_QUIET_SLEEP);
        Self {
            monitor,
            interval,
            error_backoff,
            max_quiet_sleep,
        }
    }

    /// Do whatever the current window calls for and return how long to sleep.
    pub async fn tick(&self) -> Duration {
        let hours = *self.monitor.hours();
        let now = self.monitor.now();

        if !hours.is_active(now) {
            let wait = hours.until_next_open(now);
            info!(
                "Outside business hours (current: {}), sleeping until {} ({})",
                hours.local(now).format("%H:%M"),
                hours.local(hours.next_open(now)).format("%H:%M"),
                fmt_duration(wait)
            );
            return wait.min(self.max_quiet_sleep).max(MIN_QUIET_SLEEP);
        }

        // Run the cycle in its own task so a panic is contained like an error.
        let monitor = Arc::clone(&self.monitor);
        match tokio::spawn(async move { monitor.run_cycle().await }).await {
            Ok(Ok(report)) => {
                info!(
                    notified = report.notified,
                    promoted = report.promoted,
                    "Cycle done: {} items, {} sold, {} new. Next check in {}",
                    report.snapshot.count(),
                    report.sold.len(),
                    report.added.len(),
                    fmt_duration(self.interval)
                );
                self.interval
            }
            Ok(Err(e)) => {
                error!("Monitor error: {}", e);
                self.error_backoff
            }
            Err(e) => {
                error!("Monitor cycle panicked: {}", e);
                self.monitor.record_aborted_cycle(format!("cycle panicked: {}", e));
                self.error_backoff
            }
        }
    }

    pub async fn run(self) {
        self.monitor.set_monitoring_active(true);

        let config = self.monitor.config();
        info!("Monitoring started");
        info!(
            "Business hours: {} {}",
            config.business_hours_label(),
            config.schedule.timezone
        );
        info!("Check interval: {}", fmt_duration(self.interval));
        info!(
            "Notifications: {}",
            if self.monitor.notifications_enabled() { "enabled" } else { "disabled" }
        );

        loop {
            let wait = self.tick().await;
            tokio::time::sleep(wait).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
