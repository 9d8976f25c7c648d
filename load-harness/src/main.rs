//! Load harness entry point.

use std::sync::Arc;

use clap::Parser;
use convo_loadgen::{Cli, HttpTransport, LoadHarness};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.harness_config()?;
    let transport = Arc::new(HttpTransport::new(cli.timeout())?);
    let harness = LoadHarness::new(config, transport);

    let report = harness
        .run_until(async {
            // If the handler cannot be installed, run to completion.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;

    if cli.print_bodies {
        for record in &report.records {
            println!("[{}] {} {}", record.index, record.status, record.body);
        }
    }
    println!("{}", report);

    Ok(())
}
