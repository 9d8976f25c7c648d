//! Conversation forwarding: validate, resolve, forward, unwrap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use convo_common::ForwardPayload;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::backend::{self, PredictionPayload, PredictionTransport};
use crate::config::{BackendsConfig, Config};
use crate::error::{GatewayError, GatewayFailure};
use crate::events::{EventSink, GatewayEvent};
use crate::validation::RequestValidator;

/// Per-deployment knobs of the forwarding flow.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Backend target type ("mock", "dev", "live").
    pub target: String,
    pub supports_metadata: bool,
    /// Whole-request deadline for each backend call, connect included.
    pub read_timeout: Duration,
}

impl GatewayOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target: config.backend.target.clone(),
            supports_metadata: config.gateway.supports_metadata,
            read_timeout: config.backend.read_timeout(),
        }
    }
}

/// Successful gateway answer: `received` merged with the first prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub correlation_id: Uuid,
    pub body: Map<String, Value>,
}

/// Orchestrates one conversation request end to end.
///
/// Holds no per-request state, so one instance serves all requests.
pub struct GatewayService {
    options: GatewayOptions,
    backends: BackendsConfig,
    validator: RequestValidator,
    transport: Arc<dyn PredictionTransport>,
    events: Arc<dyn EventSink>,
}

impl GatewayService {
    pub fn new(
        options: GatewayOptions,
        backends: BackendsConfig,
        transport: Arc<dyn PredictionTransport>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            validator: RequestValidator::new(options.supports_metadata),
            options,
            backends,
            transport,
            events,
        }
    }

    /// Handle a raw request body.
    ///
    /// A fresh correlation id is generated for every request; a caller-supplied
    /// id is only attached to the events.
    pub async fn handle(
        &self,
        raw: &[u8],
        caller_correlation_id: Option<&str>,
    ) -> Result<GatewayResponse, GatewayFailure> {
        let correlation_id = Uuid::new_v4();
        self.events.emit(
            GatewayEvent::Received,
            correlation_id,
            json!({
                "body_bytes": raw.len(),
                "caller_correlation_id": caller_correlation_id,
            }),
        );

        match self.process(raw, correlation_id).await {
            Ok(body) => Ok(GatewayResponse {
                correlation_id,
                body,
            }),
            Err(error) => Err(GatewayFailure {
                correlation_id,
                error,
            }),
        }
    }

    async fn process(
        &self,
        raw: &[u8],
        correlation_id: Uuid,
    ) -> Result<Map<String, Value>, GatewayError> {
        let request = self.validator.validate(raw).map_err(|e| {
            self.events.emit(
                GatewayEvent::Rejected,
                correlation_id,
                json!({ "reason": e.to_string() }),
            );
            e
        })?;

        let target = backend::resolve(&self.options.target, &self.backends).map_err(|e| {
            self.events.emit(
                GatewayEvent::ConfigurationError,
                correlation_id,
                json!({ "reason": e.to_string() }),
            );
            e
        })?;

        let payload = ForwardPayload::new(&request, Utc::now());
        self.events.emit(
            GatewayEvent::Forwarded,
            correlation_id,
            json!({
                "backend": target.kind.as_str(),
                "conversation_id": request.conversation_id,
                "message_id": request.message_id,
            }),
        );

        let start = Instant::now();
        let prediction = self
            .transport
            .forward(&target, &payload, self.options.read_timeout)
            .await
            .map_err(|e| {
                self.events.emit(
                    GatewayEvent::BackendError,
                    correlation_id,
                    json!({
                        "kind": e.kind.as_str(),
                        "detail": e.detail,
                        "latency_ms": start.elapsed().as_millis() as u64,
                    }),
                );
                e
            })?;

        self.events.emit(
            GatewayEvent::Responded,
            correlation_id,
            json!({ "latency_ms": start.elapsed().as_millis() as u64 }),
        );

        Ok(merge_prediction(payload.timestamp(), prediction))
    }
}

/// Merge the first prediction under the `received` timestamp.
///
/// Object predictions are flattened into the body; anything else lands under
/// `prediction`. The gateway's `received` always wins.
fn merge_prediction(received: &str, prediction: PredictionPayload) -> Map<String, Value> {
    let mut body = Map::new();
    match prediction {
        Value::Object(fields) => body.extend(fields),
        other => {
            body.insert("prediction".to_string(), other);
        }
    }
    body.insert("received".to_string(), Value::String(received.to_string()));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ForwardError, ForwardErrorKind, ForwardingClient};
    use crate::test_util::{test_backends, MockTransport, RecordingEventSink};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(
        transport: Arc<MockTransport>,
        events: Arc<RecordingEventSink>,
    ) -> GatewayService {
        GatewayService::new(
            GatewayOptions {
                target: "mock".to_string(),
                supports_metadata: true,
                read_timeout: Duration::from_secs(1),
            },
            test_backends("http://backend.test"),
            transport,
            events,
        )
    }

    const VALID: &[u8] =
        br#"{"message":"i have a headache","conversationId":"test","messageId":"test"}"#;

    #[tokio::test]
    async fn test_success_merges_first_prediction() {
        let transport = Arc::new(MockTransport::replying(json!({"reply": "see a doctor"})));
        let events = Arc::new(RecordingEventSink::default());

        let response = service(transport.clone(), events.clone())
            .handle(VALID, None)
            .await
            .unwrap();

        assert_eq!(response.body["reply"], "see a doctor");
        assert!(response.body["received"].is_string());
        assert_eq!(response.body.len(), 2);
        assert_eq!(transport.calls(), 1);

        let sent = transport.last_payload().unwrap();
        assert_eq!(sent.inputs.message, ["i have a headache".to_string()]);
        assert_eq!(response.body["received"], sent.timestamp());

        assert_eq!(
            events.kinds(),
            vec![
                GatewayEvent::Received,
                GatewayEvent::Forwarded,
                GatewayEvent::Responded
            ]
        );
        assert!(events.all_tagged_with(response.correlation_id));
    }

    #[tokio::test]
    async fn test_validation_failure_never_calls_backend() {
        let transport = Arc::new(MockTransport::replying(json!({})));
        let events = Arc::new(RecordingEventSink::default());

        let failure = service(transport.clone(), events.clone())
            .handle(br#"{"message":"","conversationId":"test","messageId":"test"}"#, None)
            .await
            .unwrap_err();

        assert!(matches!(failure.error, GatewayError::Validation(_)));
        assert_eq!(transport.calls(), 0);
        assert_eq!(
            events.kinds(),
            vec![GatewayEvent::Received, GatewayEvent::Rejected]
        );
    }

    #[tokio::test]
    async fn test_backend_timeout_is_backend_unavailable() {
        let transport = Arc::new(MockTransport::failing(ForwardError::new(
            ForwardErrorKind::Timeout,
            "deadline elapsed",
        )));
        let events = Arc::new(RecordingEventSink::default());

        let failure = service(transport, events.clone())
            .handle(VALID, Some("caller-42"))
            .await
            .unwrap_err();

        assert!(failure.error.status().is_server_error());
        assert_eq!(failure.error.backend_kind(), Some(ForwardErrorKind::Timeout));
        assert_eq!(events.kinds().last(), Some(&GatewayEvent::BackendError));
        assert!(events.all_tagged_with(failure.correlation_id));
        assert_eq!(
            events.fields_of(GatewayEvent::Received).unwrap()["caller_correlation_id"],
            "caller-42"
        );
    }

    #[tokio::test]
    async fn test_empty_predictions_fail_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predictions": []})))
            .mount(&server)
            .await;
        let events = Arc::new(RecordingEventSink::default());
        let service = GatewayService::new(
            GatewayOptions {
                target: "mock".to_string(),
                supports_metadata: true,
                read_timeout: Duration::from_secs(5),
            },
            test_backends(&server.uri()),
            Arc::new(ForwardingClient::new(Duration::from_secs(1)).unwrap()),
            events.clone(),
        );

        let failure = service.handle(VALID, None).await.unwrap_err();

        assert!(matches!(failure.error, GatewayError::BackendUnavailable(_)));
        assert_eq!(
            failure.error.backend_kind(),
            Some(ForwardErrorKind::MissingPredictions)
        );
        assert_eq!(
            events.fields_of(GatewayEvent::BackendError).unwrap()["kind"],
            "missing_predictions"
        );
    }

    #[tokio::test]
    async fn test_missing_backend_configuration() {
        let transport = Arc::new(MockTransport::replying(json!({})));
        let service = GatewayService::new(
            GatewayOptions {
                target: "dev".to_string(),
                supports_metadata: true,
                read_timeout: Duration::from_secs(1),
            },
            BackendsConfig::default(),
            transport.clone(),
            Arc::new(RecordingEventSink::default()),
        );

        let failure = service.handle(VALID, None).await.unwrap_err();
        assert!(matches!(failure.error, GatewayError::Configuration(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_correlation_ids_are_unique_per_request() {
        let transport = Arc::new(MockTransport::replying(json!({"reply": "ok"})));
        let service = service(transport, Arc::new(RecordingEventSink::default()));

        let first = service.handle(VALID, Some("same")).await.unwrap();
        let second = service.handle(VALID, Some("same")).await.unwrap();
        assert_ne!(first.correlation_id, second.correlation_id);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let transport = Arc::new(
            MockTransport::replying(json!({"reply": "ok"})).with_delay(Duration::from_millis(50)),
        );
        let service = Arc::new(service(
            transport.clone(),
            Arc::new(RecordingEventSink::default()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    let body = json!({
                        "message": format!("turn {}", i),
                        "conversationId": "conv",
                        "messageId": format!("msg-{}", i),
                    })
                    .to_string();
                    service.handle(body.as_bytes(), None).await
                })
            })
            .collect();

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.body["reply"], "ok");
            ids.insert(response.correlation_id);
        }
        assert_eq!(ids.len(), 8);
        assert_eq!(transport.calls(), 8);
    }

    #[test]
    fn test_merge_non_object_prediction() {
        let body = merge_prediction("2024-01-01T00:00:00Z", json!("plain text"));
        assert_eq!(body["prediction"], "plain text");
        assert_eq!(body["received"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_merge_keeps_gateway_received() {
        let body = merge_prediction("gateway-time", json!({"received": "backend-time", "a": 1}));
        assert_eq!(body["received"], "gateway-time");
        assert_eq!(body["a"], 1);
    }
}
