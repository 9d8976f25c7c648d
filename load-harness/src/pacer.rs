//! Fixed-interval start signals.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::{self, Interval, MissedTickBehavior};

use crate::error::{HarnessError, Result};

const PRESETS: &[(&str, u64)] = &[
    ("25%", 4000),
    ("50%", 2000),
    ("100%", 1000),
    ("150%", 750),
    ("200%", 500),
];

/// Named load preset mapping a percentage of nominal load to an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLevel {
    label: &'static str,
    interval: Duration,
}

impl LoadLevel {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn presets() -> impl Iterator<Item = LoadLevel> {
        PRESETS.iter().map(|&(label, millis)| LoadLevel {
            label,
            interval: Duration::from_millis(millis),
        })
    }
}

impl FromStr for LoadLevel {
    type Err = HarnessError;

    /// Accepts "150%" as well as a bare "150".
    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let wanted = trimmed.trim_end_matches('%');
        Self::presets()
            .find(|level| level.label.trim_end_matches('%') == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = PRESETS.iter().map(|(label, _)| *label).collect();
                HarnessError::UnknownLoadLevel(trimmed.to_string(), known.join(", "))
            })
    }
}

impl fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}ms)", self.label, self.interval.as_millis())
    }
}

/// Emits exactly `total` start signals, one per interval, the first one
/// immediately.
///
/// Must be created inside a tokio runtime.
pub struct LoadPacer {
    ticker: Interval,
    total: usize,
    issued: usize,
}

impl LoadPacer {
    pub fn new(total: usize, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(HarnessError::ZeroInterval);
        }
        let mut ticker = time::interval(interval);
        // A late tick pushes the rest of the schedule back instead of bursting.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Self {
            ticker,
            total,
            issued: 0,
        })
    }

    /// Wait for the next start and return its index, or `None` once all
    /// starts have been issued. Cancel safe.
    pub async fn next_start(&mut self) -> Option<usize> {
        if self.issued >= self.total {
            return None;
        }
        self.ticker.tick().await;
        let index = self.issued;
        self.issued += 1;
        Some(index)
    }

    pub fn issued(&self) -> usize {
        self.issued
    }
}
