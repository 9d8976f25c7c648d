//! Inbound conversation request validation.

use convo_common::ConversationRequest;
use serde_json::Value;

/// Why an inbound request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Body is not JSON, not an object, lacks a required key or has a key of the wrong type.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    /// A required field is null or blank after trimming.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MalformedInput(_) => "malformed_input",
            ValidationError::MissingField(_) => "missing_field",
        }
    }
}

/// Normalizes and checks raw conversation request bodies.
#[derive(Debug, Clone, Copy)]
pub struct RequestValidator {
    supports_metadata: bool,
}

impl RequestValidator {
    pub fn new(supports_metadata: bool) -> Self {
        Self { supports_metadata }
    }

    /// Parse `raw` into a trimmed [`ConversationRequest`].
    pub fn validate(&self, raw: &[u8]) -> Result<ConversationRequest, ValidationError> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| ValidationError::MalformedInput(format!("invalid JSON: {}", e)))?;

        let Value::Object(mut fields) = value else {
            return Err(ValidationError::MalformedInput(
                "expected a JSON object".to_string(),
            ));
        };

        // Key/type problems are reported before blank values so a wrong shape
        // is never mistaken for an empty field.
        let message = required_string(&fields, "message")?;
        let conversation_id = required_string(&fields, "conversationId")?;
        let message_id = required_string(&fields, "messageId")?;

        let message = non_blank(message, "message")?;
        let conversation_id = non_blank(conversation_id, "conversationId")?;
        let message_id = non_blank(message_id, "messageId")?;

        let metadata = match fields.remove("metadata") {
            _ if !self.supports_metadata => None,
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                return Err(ValidationError::MalformedInput(
                    "metadata must be an object".to_string(),
                ))
            }
        };

        Ok(ConversationRequest {
            message,
            conversation_id,
            message_id,
            metadata: metadata.filter(|m| !m.is_empty()),
        })
    }
}

/// Look up a required key; `Ok(None)` means it is present but null.
fn required_string<'a>(
    fields: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'a str>, ValidationError> {
    match fields.get(name) {
        None => Err(ValidationError::MalformedInput(format!(
            "missing key `{}`",
            name
        ))),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ValidationError::MalformedInput(format!(
            "`{}` must be a string",
            name
        ))),
    }
}

fn non_blank(value: Option<&str>, name: &'static str) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ValidationError::MissingField(name)),
    }
}
