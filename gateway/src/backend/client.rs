//! HTTP client for the prediction backend.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use convo_common::{ForwardPayload, PredictionResponse};
use reqwest::Client;
use thiserror::Error;

use super::{BackendTarget, PredictionPayload, PredictionTransport};

/// Longest slice of an upstream error body kept for logs.
const MAX_ERROR_BODY: usize = 512;

/// Classification of a failed forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardErrorKind {
    /// Connection refused, reset, DNS failure.
    Network,
    /// Connect timeout or whole-request deadline elapsed.
    Timeout,
    /// Response body is not the expected JSON.
    Decode,
    /// `predictions` absent or empty.
    MissingPredictions,
    /// Backend answered with a non-success HTTP status.
    UpstreamStatus,
}

impl ForwardErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ForwardErrorKind::Network => "network",
            ForwardErrorKind::Timeout => "timeout",
            ForwardErrorKind::Decode => "decode",
            ForwardErrorKind::MissingPredictions => "missing_predictions",
            ForwardErrorKind::UpstreamStatus => "upstream_status",
        }
    }
}

impl fmt::Display for ForwardErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forward that did not produce a prediction.
#[derive(Debug, Clone, Error)]
#[error("Backend call failed ({kind}): {detail}")]
pub struct ForwardError {
    pub kind: ForwardErrorKind,
    /// Internal detail, for logs only.
    pub detail: String,
}

impl ForwardError {
    pub fn new(kind: ForwardErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ForwardErrorKind::Timeout
        } else if err.is_decode() {
            ForwardErrorKind::Decode
        } else {
            ForwardErrorKind::Network
        };
        Self::new(kind, err.to_string())
    }
}

/// Single-shot forwarding client.
///
/// The connect timeout lives on the pooled `reqwest::Client`. Each call also
/// gets a whole-request deadline covering connect, send and body read.
/// Nothing is retried.
#[derive(Debug, Clone)]
pub struct ForwardingClient {
    http_client: Client,
}

impl ForwardingClient {
    pub fn new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl PredictionTransport for ForwardingClient {
    async fn forward(
        &self,
        target: &BackendTarget,
        payload: &ForwardPayload,
        timeout: Duration,
    ) -> Result<PredictionPayload, ForwardError> {
        tracing::debug!("Forwarding to {} backend at {}", target.kind, target.base_url);

        let response = self
            .http_client
            .post(&target.base_url)
            .bearer_auth(&target.auth_token)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(ForwardError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ForwardError::new(
                ForwardErrorKind::UpstreamStatus,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let body = response.bytes().await.map_err(ForwardError::from_reqwest)?;
        let decoded: PredictionResponse = serde_json::from_slice(&body)
            .map_err(|e| ForwardError::new(ForwardErrorKind::Decode, e.to_string()))?;

        decoded.into_first().ok_or_else(|| {
            ForwardError::new(
                ForwardErrorKind::MissingPredictions,
                "backend returned no predictions",
            )
        })
    }
}
