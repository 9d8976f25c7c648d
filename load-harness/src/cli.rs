//! Command-line interface for the load harness.

use std::time::Duration;

use clap::Parser;

use crate::error::{HarnessError, Result};
use crate::harness::HarnessConfig;
use crate::pacer::LoadLevel;
use crate::task::PayloadShape;

#[derive(Parser, Debug)]
#[command(author, version, about = "Paced load generator for the conversation gateway", long_about = None)]
pub struct Cli {
    /// Endpoint every request is sent to
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8000/product-conversation")]
    pub url: String,

    /// Total number of requests to issue
    #[arg(short = 'n', long, default_value_t = 50)]
    pub requests: usize,

    /// Load preset: 25%, 50%, 100%, 150% or 200%
    #[arg(short, long, value_name = "LEVEL", default_value = "100%")]
    pub load_level: String,

    /// Explicit spacing between starts, overriding the load level
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Body to send
    #[arg(long, value_enum, default_value_t = PayloadShape::Fastapi)]
    pub shape: PayloadShape,

    /// Message text carried by every request
    #[arg(short, long, default_value = "i have a headache")]
    pub message: String,

    /// Per-request client timeout in seconds
    #[arg(long, default_value_t = 130)]
    pub timeout_secs: u64,

    /// Print every response body after the run
    #[arg(long)]
    pub print_bodies: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn interval(&self) -> Result<Duration> {
        match self.interval_ms {
            Some(0) => Err(HarnessError::ZeroInterval),
            Some(ms) => Ok(Duration::from_millis(ms)),
            None => Ok(self.load_level.parse::<LoadLevel>()?.interval()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn harness_config(&self) -> Result<HarnessConfig> {
        Ok(HarnessConfig {
            target_url: self.url.clone(),
            requests: self.requests,
            interval: self.interval()?,
            shape: self.shape,
            message: self.message.clone(),
        })
    }
}
