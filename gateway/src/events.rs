//! Structured gateway events.
//!
//! The service reports what happens to each request through an injected
//! [`EventSink`]; the binary wires in [`TracingEventSink`].

use std::fmt;

use serde_json::Value;
use uuid::Uuid;

/// Lifecycle points of one gateway request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEvent {
    /// Request accepted off the wire.
    Received,
    /// Request failed validation; no backend call was made.
    Rejected,
    /// Payload handed to the backend.
    Forwarded,
    /// Backend call failed.
    BackendError,
    /// Backend target could not be resolved.
    ConfigurationError,
    /// Prediction returned to the caller.
    Responded,
}

impl GatewayEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            GatewayEvent::Received => "received",
            GatewayEvent::Rejected => "rejected",
            GatewayEvent::Forwarded => "forwarded",
            GatewayEvent::BackendError => "backend_error",
            GatewayEvent::ConfigurationError => "configuration_error",
            GatewayEvent::Responded => "responded",
        }
    }

    fn is_failure(self) -> bool {
        matches!(
            self,
            GatewayEvent::BackendError | GatewayEvent::ConfigurationError
        )
    }
}

impl fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of gateway events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GatewayEvent, correlation_id: Uuid, fields: Value);
}

/// Writes every event to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: GatewayEvent, correlation_id: Uuid, fields: Value) {
        if event.is_failure() {
            tracing::warn!(
                target: "convo_gateway::events",
                event = event.as_str(),
                correlation_id = %correlation_id,
                fields = %fields,
                "Gateway event"
            );
        } else {
            tracing::info!(
                target: "convo_gateway::events",
                event = event.as_str(),
                correlation_id = %correlation_id,
                fields = %fields,
                "Gateway event"
            );
        }
    }
}
