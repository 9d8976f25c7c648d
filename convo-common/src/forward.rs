//! Prediction backend wire format.
//!
//! The backend expects every input column wrapped in a single-element array
//! (`{"inputs": {"message": ["..."], ...}}`) and answers with
//! `{"predictions": [...]}`. Fixed-size arrays keep the wrapping in the type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationRequest, Metadata};

/// Request body sent to the prediction backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardPayload {
    pub inputs: ForwardInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardInputs {
    pub message: [String; 1],
    pub conversation_id: [String; 1],
    pub message_id: [String; 1],
    /// ISO-8601 capture time.
    pub timestamp: [String; 1],
    /// `[null]` when the turn carries no metadata.
    pub metadata: [Option<Metadata>; 1],
}

impl ForwardPayload {
    /// Wrap a conversation turn for the backend, stamped with `timestamp`.
    pub fn new(request: &ConversationRequest, timestamp: DateTime<Utc>) -> Self {
        Self {
            inputs: ForwardInputs {
                message: [request.message.clone()],
                conversation_id: [request.conversation_id.clone()],
                message_id: [request.message_id.clone()],
                timestamp: [format_timestamp(timestamp)],
                metadata: [request.metadata.clone()],
            },
        }
    }

    /// Timestamp the payload was stamped with.
    pub fn timestamp(&self) -> &str {
        &self.inputs.timestamp[0]
    }

    /// Unwrap the payload back into the conversation turn it was built from.
    pub fn to_request(&self) -> ConversationRequest {
        let [message] = &self.inputs.message;
        let [conversation_id] = &self.inputs.conversation_id;
        let [message_id] = &self.inputs.message_id;
        let [metadata] = &self.inputs.metadata;
        ConversationRequest {
            message: message.clone(),
            conversation_id: conversation_id.clone(),
            message_id: message_id.clone(),
            metadata: metadata.clone(),
        }
    }
}

/// Format a timestamp the way it travels on the wire.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Response body returned by the prediction backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<serde_json::Value>>,
}

impl PredictionResponse {
    pub fn new(predictions: Vec<serde_json::Value>) -> Self {
        Self {
            predictions: Some(predictions),
        }
    }

    /// First prediction entry, if the backend returned any.
    pub fn into_first(self) -> Option<serde_json::Value> {
        self.predictions.and_then(|p| p.into_iter().next())
    }
}
