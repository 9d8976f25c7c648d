//! Conversation gateway server.

use std::sync::Arc;

use convo_gateway::backend;
use convo_gateway::{build_router, logging, AppState, Config, ForwardingClient, TracingEventSink};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    logging::init_tracing(&config.logging.level);

    tracing::info!("Starting conversation gateway");

    // No request can succeed without the selected backend, so fail at boot.
    let target = backend::resolve(&config.backend.target, &config.backend)?;
    tracing::info!(
        "Forwarding to {} backend at {} (connect timeout {}s, read timeout {}s)",
        target.kind,
        target.base_url,
        config.backend.connect_timeout_secs,
        config.backend.read_timeout_secs
    );

    let transport = Arc::new(ForwardingClient::new(config.backend.connect_timeout())?);
    let events = Arc::new(TracingEventSink);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, transport, events));
    let app = build_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
