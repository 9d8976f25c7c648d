//! Outcome collection shared by all in-flight tasks.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::Mutex;

/// How a single request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeStatus {
    /// A response arrived with this status code.
    Http(u16),
    /// No response within the client timeout.
    TimedOut,
    /// The request could not be sent or the task died.
    Unreachable,
}

impl OutcomeStatus {
    /// Status reported for a client-side timeout.
    pub const TIMEOUT_SENTINEL: u16 = 504;

    pub fn code(self) -> Option<u16> {
        match self {
            OutcomeStatus::Http(code) => Some(code),
            OutcomeStatus::TimedOut => Some(Self::TIMEOUT_SENTINEL),
            OutcomeStatus::Unreachable => None,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, OutcomeStatus::Http(code) if (200..300).contains(&code))
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Http(code) => write!(f, "{}", code),
            OutcomeStatus::TimedOut => write!(f, "{} (client timeout)", Self::TIMEOUT_SENTINEL),
            OutcomeStatus::Unreachable => f.write_str("unreachable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub index: usize,
    pub status: OutcomeStatus,
    /// Response body, or the failure description when there was no response.
    pub body: String,
    pub latency: Duration,
}

impl OutcomeRecord {
    pub fn unreachable(index: usize, detail: impl Into<String>) -> Self {
        Self {
            index,
            status: OutcomeStatus::Unreachable,
            body: detail.into(),
            latency: Duration::ZERO,
        }
    }
}

/// Count of outcomes per status, ordered by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeSummary {
    counts: BTreeMap<OutcomeStatus, usize>,
}

impl OutcomeSummary {
    pub fn counts(&self) -> &BTreeMap<OutcomeStatus, usize> {
        &self.counts
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn successes(&self) -> usize {
        self.counts
            .iter()
            .filter(|(status, _)| status.is_success())
            .map(|(_, count)| count)
            .sum()
    }
}

impl fmt::Display for OutcomeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {:>8}", "status", "count")?;
        for (status, count) in &self.counts {
            writeln!(f, "{:<24} {:>8}", status.to_string(), count)?;
        }
        write!(f, "{:<24} {:>8}", "total", self.total())
    }
}

/// Thread-safe outcome counter. Every record increments exactly one status.
#[derive(Debug, Default)]
pub struct OutcomeAggregator {
    counts: Mutex<BTreeMap<OutcomeStatus, usize>>,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, record: &OutcomeRecord) {
        let mut counts = self.counts.lock().await;
        *counts.entry(record.status).or_insert(0) += 1;
    }

    pub async fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            counts: self.counts.lock().await.clone(),
        }
    }
}
