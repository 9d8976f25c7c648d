//! Paced, overlapping load generation.
//!
//! Starts are issued on a fixed schedule regardless of whether earlier
//! requests have completed, so a slow target sees requests pile up.

use std::fmt;
use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::Instant;

use crate::aggregator::{OutcomeAggregator, OutcomeRecord, OutcomeSummary};
use crate::error::Result;
use crate::pacer::LoadPacer;
use crate::task::{LoadTask, PayloadShape};
use crate::transport::LoadTransport;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub target_url: String,
    pub requests: usize,
    pub interval: Duration,
    pub shape: PayloadShape,
    pub message: String,
}

/// Result of one harness run.
#[derive(Debug, Clone)]
pub struct HarnessReport {
    pub requested: usize,
    /// One record per issued task, ordered by index.
    pub records: Vec<OutcomeRecord>,
    pub summary: OutcomeSummary,
    pub elapsed: Duration,
}

impl HarnessReport {
    pub fn issued(&self) -> usize {
        self.records.len()
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Issued {} of {} requests in {:.2}s",
            self.issued(),
            self.requested,
            self.elapsed.as_secs_f64()
        )?;
        write!(f, "{}", self.summary)
    }
}

pub struct LoadHarness {
    config: HarnessConfig,
    transport: Arc<dyn LoadTransport>,
}

impl LoadHarness {
    pub fn new(config: HarnessConfig, transport: Arc<dyn LoadTransport>) -> Self {
        Self { config, transport }
    }

    /// Issue every configured request and wait for all of them.
    pub async fn run(&self) -> Result<HarnessReport> {
        self.run_until(future::pending()).await
    }

    /// Like [`run`](Self::run), but stop issuing new requests once `stop`
    /// resolves. Requests already in flight are still awaited and counted.
    pub async fn run_until<F>(&self, stop: F) -> Result<HarnessReport>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let aggregator = Arc::new(OutcomeAggregator::new());
        let mut pacer = LoadPacer::new(self.config.requests, self.config.interval)?;
        // Sized by issued starts, never by the requested count.
        let mut handles = Vec::new();

        tracing::info!(
            target_url = %self.config.target_url,
            requests = self.config.requests,
            interval_ms = self.config.interval.as_millis() as u64,
            shape = ?self.config.shape,
            "Starting load run"
        );

        tokio::pin!(stop);
        loop {
            let index = tokio::select! {
                next = pacer.next_start() => match next {
                    Some(index) => index,
                    None => break,
                },
                _ = &mut stop => {
                    tracing::warn!(issued = pacer.issued(), "Stop requested, no further requests will be issued");
                    break;
                }
            };

            let task = LoadTask::new(
                index,
                &self.config.target_url,
                self.config.shape,
                &self.config.message,
            );
            tracing::info!("{} {}", task.method(), index);

            let transport = self.transport.clone();
            let aggregator = aggregator.clone();
            let handle = tokio::spawn(async move {
                let record = transport.execute(&task).await;
                aggregator.record(&record).await;
                record
            });
            handles.push((index, handle));
        }

        let finished = join_all(
            handles
                .into_iter()
                .map(|(index, handle)| async move { (index, handle.await) }),
        )
        .await;

        let mut records = Vec::with_capacity(finished.len());
        for (index, result) in finished {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::error!(index, error = %e, "Load task failed");
                    let record = OutcomeRecord::unreachable(index, e.to_string());
                    aggregator.record(&record).await;
                    records.push(record);
                }
            }
        }
        records.sort_by_key(|record| record.index);

        let report = HarnessReport {
            requested: self.config.requests,
            records,
            summary: aggregator.summary().await,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            issued = report.issued(),
            successes = report.summary.successes(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Load run finished"
        );
        Ok(report)
    }
}
