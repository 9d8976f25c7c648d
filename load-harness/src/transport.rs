//! Executes a single load task.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::aggregator::{OutcomeRecord, OutcomeStatus};
use crate::error::Result;
use crate::task::LoadTask;

/// Sends a task and reports how it ended. Never fails: every way a request
/// can go wrong is an outcome.
#[async_trait]
pub trait LoadTransport: Send + Sync {
    async fn execute(&self, task: &LoadTask) -> OutcomeRecord;
}

/// reqwest-backed transport with a whole-request deadline.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl LoadTransport for HttpTransport {
    async fn execute(&self, task: &LoadTask) -> OutcomeRecord {
        let request = match &task.payload {
            Some(payload) => self.client.post(&task.target_url).json(payload),
            None => self.client.get(&task.target_url),
        };

        let started = Instant::now();
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            // A body that fails mid-read still counts under its status.
            let body = response.text().await.unwrap_or_default();
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok((code, body))) => (OutcomeStatus::Http(code), body),
            Ok(Err(e)) if e.is_timeout() => (OutcomeStatus::TimedOut, e.to_string()),
            Ok(Err(e)) => (OutcomeStatus::Unreachable, e.to_string()),
            Err(_) => (
                OutcomeStatus::TimedOut,
                format!("no response within {}s", self.timeout.as_secs_f64()),
            ),
        };

        let latency = started.elapsed();
        tracing::debug!(
            index = task.index,
            status = %status,
            latency_ms = latency.as_millis() as u64,
            "Task finished"
        );

        OutcomeRecord {
            index: task.index,
            status,
            body,
            latency,
        }
    }
}
