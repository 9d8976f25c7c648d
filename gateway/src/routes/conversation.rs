//! Conversation forwarding endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::AppState;

/// Header carrying the correlation id, inbound (caller's) and outbound (ours).
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Build the conversation router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/product-conversation", post(product_conversation))
}

/// POST /product-conversation - validate and forward a conversation turn.
///
/// The body is taken as raw bytes so malformed JSON gets the same structured
/// error shape as every other failure.
async fn product_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let caller_id = headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.service.handle(&body, caller_id).await {
        Ok(response) => (
            StatusCode::OK,
            [(CORRELATION_HEADER, response.correlation_id.to_string())],
            Json(response.body),
        )
            .into_response(),
        Err(failure) => {
            let rendered = failure
                .error
                .render(&state.config.messages, failure.correlation_id);
            (
                [(CORRELATION_HEADER, failure.correlation_id.to_string())],
                rendered,
            )
                .into_response()
        }
    }
}
