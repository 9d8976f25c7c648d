//! Conversation gateway: validates chat turns from a front-end and forwards
//! them to a configurable prediction backend.

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod routes;
pub mod service;
pub mod test_util;
pub mod validation;

pub use backend::{
    BackendKind, BackendTarget, ForwardError, ForwardErrorKind, ForwardingClient,
    PredictionTransport, RouterError,
};
pub use config::{Config, ConfigError};
pub use error::{ErrorBody, GatewayError, GatewayFailure};
pub use events::{EventSink, GatewayEvent, TracingEventSink};
pub use service::{GatewayOptions, GatewayResponse, GatewayService};
pub use validation::{RequestValidator, ValidationError};

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub service: GatewayService,
}

impl AppState {
    pub fn new(
        config: Config,
        transport: Arc<dyn PredictionTransport>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let service = GatewayService::new(
            GatewayOptions::from_config(&config),
            config.backend.clone(),
            transport,
            events,
        );
        Self { config, service }
    }
}

/// Build the HTTP router with all gateway routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::conversation::router())
        .layer(middleware::from_fn(logging::request_logger))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
