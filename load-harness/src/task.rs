//! One paced request and the payload it carries.

use chrono::Utc;
use clap::ValueEnum;
use convo_common::{ConversationRequest, ForwardPayload};
use serde::Serialize;
use tokio::time::Instant;

/// Conversation id shared by every generated request.
pub const LOAD_CONVERSATION_ID: &str = "load-test";

/// Which body the harness sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayloadShape {
    /// Flat conversation request, as the gateway expects.
    Fastapi,
    /// `inputs`-wrapped payload, as a prediction backend expects.
    Databricks,
    /// Bare GET with no body.
    Probe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskPayload {
    Flat(ConversationRequest),
    Wrapped(ForwardPayload),
}

#[derive(Debug, Clone)]
pub struct LoadTask {
    pub index: usize,
    pub target_url: String,
    /// `None` means the task is sent as a GET.
    pub payload: Option<TaskPayload>,
    pub issued_at: Instant,
}

impl LoadTask {
    pub fn new(index: usize, target_url: &str, shape: PayloadShape, message: &str) -> Self {
        let request =
            ConversationRequest::new(message, LOAD_CONVERSATION_ID, format!("load-{}", index));
        let payload = match shape {
            PayloadShape::Fastapi => Some(TaskPayload::Flat(request)),
            PayloadShape::Databricks => {
                Some(TaskPayload::Wrapped(ForwardPayload::new(&request, Utc::now())))
            }
            PayloadShape::Probe => None,
        };

        Self {
            index,
            target_url: target_url.to_string(),
            payload,
            issued_at: Instant::now(),
        }
    }

    pub fn method(&self) -> &'static str {
        if self.payload.is_some() {
            "POST"
        } else {
            "GET"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fastapi_shape_is_flat_request() {
        let task = LoadTask::new(3, "http://gw/product-conversation", PayloadShape::Fastapi, "hi");

        assert_eq!(task.method(), "POST");
        assert_eq!(
            serde_json::to_value(task.payload.unwrap()).unwrap(),
            json!({"message": "hi", "conversationId": "load-test", "messageId": "load-3"})
        );
    }

    #[test]
    fn test_databricks_shape_wraps_inputs() {
        let task = LoadTask::new(0, "http://backend/invocations", PayloadShape::Databricks, "hi");

        let value = serde_json::to_value(task.payload.unwrap()).unwrap();
        assert_eq!(value["inputs"]["message"], json!(["hi"]));
        assert_eq!(value["inputs"]["messageId"], json!(["load-0"]));
        assert_eq!(value["inputs"]["metadata"], json!([null]));
        assert!(value["inputs"]["timestamp"][0].is_string());
    }

    #[test]
    fn test_probe_shape_has_no_body() {
        let task = LoadTask::new(1, "http://gw/hello", PayloadShape::Probe, "ignored");
        assert!(task.payload.is_none());
        assert_eq!(task.method(), "GET");
    }

    #[test]
    fn test_message_ids_are_unique_per_index() {
        let ids: Vec<_> = (0..3)
            .map(|i| match LoadTask::new(i, "u", PayloadShape::Fastapi, "m").payload {
                Some(TaskPayload::Flat(request)) => request.message_id,
                other => panic!("unexpected payload: {:?}", other),
            })
            .collect();
        assert_eq!(ids, vec!["load-0", "load-1", "load-2"]);
    }
}
