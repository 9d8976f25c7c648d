//! Error types for the gateway and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{ForwardError, ForwardErrorKind, RouterError};
use crate::config::MessagesConfig;
use crate::validation::ValidationError;

/// Everything that can stop a conversation request from producing a prediction.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] RouterError),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[from] ForwardError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Validation(e) => e.code(),
            GatewayError::Configuration(_) => "configuration_missing",
            GatewayError::BackendUnavailable(_) => "backend_unavailable",
        }
    }

    /// Failure class of the backend call, when the backend was the problem.
    pub fn backend_kind(&self) -> Option<ForwardErrorKind> {
        match self {
            GatewayError::BackendUnavailable(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Build the caller-facing error. Only configured texts are exposed.
    pub fn render(&self, messages: &MessagesConfig, correlation_id: Uuid) -> ErrorResponse {
        let (message, field) = match self {
            GatewayError::Validation(ValidationError::MissingField(name)) => {
                (messages.null_value_error.clone(), Some(name.to_string()))
            }
            GatewayError::Validation(ValidationError::MalformedInput(_)) => {
                (messages.invalid_json_message.clone(), None)
            }
            GatewayError::Configuration(_) | GatewayError::BackendUnavailable(_) => {
                (messages.internal_server_error.clone(), None)
            }
        };

        ErrorResponse {
            status: self.status(),
            body: ErrorBody {
                error: ErrorDetail {
                    error_type: self.error_type().to_string(),
                    message,
                    field,
                },
                correlation_id,
            },
        }
    }
}

/// A failed request together with the correlation id it was handled under.
#[derive(Debug)]
pub struct GatewayFailure {
    pub correlation_id: Uuid,
    pub error: GatewayError,
}

/// JSON error body returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: ErrorDetail,
    pub correlation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Rendered error, ready to go out as an HTTP response.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
