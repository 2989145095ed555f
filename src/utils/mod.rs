use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Logs how long a stage took when dropped; warns past `slow_after`.
pub struct Timer {
    stage: &'static str,
    started: Instant,
    slow_after: Option<Duration>,
}

impl Timer {
    pub fn start(stage: &'static str) -> Self {
        debug!(stage, "⏱  started");
        Self {
            stage,
            started: Instant::now(),
            slow_after: None,
        }
    }

    pub fn slow_after(mut self, budget: Duration) -> Self {
        self.slow_after = Some(budget);
        self
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let took = self.started.elapsed();
        match self.slow_after {
            Some(budget) if took > budget => {
                warn!(stage = self.stage, took = ?took, budget = ?budget, "⏱  slow stage")
            }
            _ => info!(stage = self.stage, took = %fmt_duration(took), "⏱  finished"),
        }
    }
}

/// Compact human form for sleep lengths: "45s", "12.5min", "3.2h".
pub fn fmt_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{}s", d.as_secs())
    } else if secs < 3600.0 {
        format!("{:.1}min", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}
