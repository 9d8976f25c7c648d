//! Prediction backend access.
//!
//! This module provides:
//! - Target resolution from the configured environment (mock/dev/live)
//! - The `PredictionTransport` seam the gateway forwards through
//! - A reqwest-based forwarding client

mod client;
pub mod router;

pub use client::{ForwardError, ForwardErrorKind, ForwardingClient};
pub use router::{resolve, BackendKind, BackendTarget, RouterError};

use std::time::Duration;

use async_trait::async_trait;
use convo_common::ForwardPayload;

/// The first prediction entry returned by a backend, left untyped.
pub type PredictionPayload = serde_json::Value;

/// One outbound prediction call.
///
/// Implementations issue a single request bounded as a whole by the given
/// deadline and never retry.
#[async_trait]
pub trait PredictionTransport: Send + Sync {
    async fn forward(
        &self,
        target: &BackendTarget,
        payload: &ForwardPayload,
        timeout: Duration,
    ) -> Result<PredictionPayload, ForwardError>;
}
