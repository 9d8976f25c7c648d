//! Front-end conversation request.

use serde::{Deserialize, Serialize};

/// Free-form metadata attached to a conversation turn.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single conversation turn as sent by the front-end.
///
/// Values of this type handed out by the gateway validator always carry
/// trimmed, non-empty `message`, `conversation_id` and `message_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    pub message: String,
    pub conversation_id: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl ConversationRequest {
    pub fn new(
        message: impl Into<String>,
        conversation_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            conversation_id: conversation_id.into(),
            message_id: message_id.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
