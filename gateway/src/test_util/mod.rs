//! Test doubles shared by unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use convo_common::ForwardPayload;
use serde_json::Value;
use uuid::Uuid;

use crate::backend::{BackendTarget, ForwardError, PredictionPayload, PredictionTransport};
use crate::config::{BackendsConfig, Config, EndpointConfig, MessagesConfig};
use crate::events::{EventSink, GatewayEvent};

pub const TEST_TOKEN: &str = "test-token";

/// Backends config with every environment pointing at `base_url`.
pub fn test_backends(base_url: &str) -> BackendsConfig {
    BackendsConfig {
        target: "mock".to_string(),
        connect_timeout_secs: 1,
        read_timeout_secs: 5,
        mock: Some(EndpointConfig::new(base_url, TEST_TOKEN)),
        dev: Some(EndpointConfig::new(base_url, TEST_TOKEN)),
        live: Some(EndpointConfig::new(base_url, TEST_TOKEN)),
    }
}

/// Full gateway config targeting the mock backend at `base_url`.
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config {
        backend: test_backends(base_url),
        messages: MessagesConfig {
            null_value_error: "Null values are not allowed".to_string(),
            invalid_json_message: "Invalid JSON".to_string(),
            internal_server_error: "Internal Server Error".to_string(),
        },
        ..Config::default()
    };
    config.server.host = "127.0.0.1".to_string();
    config.gateway.hello_delay_secs = 0;
    config
}

/// Event sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(GatewayEvent, Uuid, Value)>>,
}

impl RecordingEventSink {
    pub fn kinds(&self) -> Vec<GatewayEvent> {
        self.lock().iter().map(|(event, _, _)| *event).collect()
    }

    pub fn fields_of(&self, event: GatewayEvent) -> Option<Value> {
        self.lock()
            .iter()
            .find(|(e, _, _)| *e == event)
            .map(|(_, _, fields)| fields.clone())
    }

    pub fn all_tagged_with(&self, correlation_id: Uuid) -> bool {
        self.lock().iter().all(|(_, id, _)| *id == correlation_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(GatewayEvent, Uuid, Value)>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: GatewayEvent, correlation_id: Uuid, fields: Value) {
        self.lock().push((event, correlation_id, fields));
    }
}

/// Transport that answers every call with a fixed result and counts calls.
pub struct MockTransport {
    result: Result<PredictionPayload, ForwardError>,
    delay: Duration,
    calls: AtomicUsize,
    last_payload: Mutex<Option<ForwardPayload>>,
}

impl MockTransport {
    pub fn replying(prediction: PredictionPayload) -> Self {
        Self::with_result(Ok(prediction))
    }

    pub fn failing(error: ForwardError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<PredictionPayload, ForwardError>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<ForwardPayload> {
        self.last_payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PredictionTransport for MockTransport {
    async fn forward(
        &self,
        _target: &BackendTarget,
        payload: &ForwardPayload,
        _timeout: Duration,
    ) -> Result<PredictionPayload, ForwardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(payload.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}
