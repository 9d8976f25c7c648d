//! Liveness endpoints that never touch the backend.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::Instrument;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/welcome", get(welcome))
        .route("/hello", get(hello))
        .route("/health", get(health))
}

/// GET /welcome - plain text greeting.
async fn welcome() -> &'static str {
    "Welcome to the conversation gateway"
}

/// GET /hello - sleeps, then answers. Used to check the service stays
/// responsive under load without involving the backend.
async fn hello(State(state): State<Arc<AppState>>) -> Json<Value> {
    tracing::info!("Processing request for /hello");

    let delay = Duration::from_secs(state.config.gateway.hello_delay_secs);
    tokio::time::sleep(delay)
        .instrument(tracing::info_span!("hello_sleep"))
        .await;

    tracing::info!("Request processed");
    Json(json!({ "message": "hello world" }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
