//! Time source and the daily business-hours gate.

use crate::config::AppConfig;
use crate::errors::Result;
use chrono::{DateTime, Days, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    ActiveWindow,
    QuietWindow,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowState::ActiveWindow => write!(f, "active"),
            WindowState::QuietWindow => write!(f, "quiet"),
        }
    }
}

/// `[start, end)` local hours in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct BusinessHours {
    start: u32,
    end: u32,
    tz: Tz,
}

impl BusinessHours {
    pub fn new(start: u32, end: u32, tz: Tz) -> Self {
        Self { start, end, tz }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            config.schedule.business_start,
            config.schedule.business_end,
            config.timezone()?,
        ))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn local(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.tz)
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> WindowState {
        let hour = self.local(now).hour();
        if self.start <= hour && hour < self.end {
            WindowState::ActiveWindow
        } else {
            WindowState::QuietWindow
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == WindowState::ActiveWindow
    }

    /// Next moment the window opens: today if before `start`, else tomorrow.
    pub fn next_open(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = self.local(now);
        let mut date = local.date_naive();
        if local.hour() >= self.start {
            date = date.checked_add_days(Days::new(1)).unwrap_or(date);
        }

        let opening = date.and_hms_opt(self.start, 0, 0).and_then(|naive| {
            self.tz
                .from_local_datetime(&naive)
                .earliest()
                // start hour skipped by a DST jump: open at the first valid hour
                .or_else(|| {
                    self.tz
                        .from_local_datetime(&(naive + ChronoDuration::hours(1)))
                        .earliest()
                })
        });

        match opening {
            Some(t) => t.with_timezone(&Utc),
            None => now + ChronoDuration::hours(1),
        }
    }

    pub fn until_next_open(&self, now: DateTime<Utc>) -> Duration {
        (self.next_open(now) - now).to_std().unwrap_or(Duration::ZERO)
    }
}
