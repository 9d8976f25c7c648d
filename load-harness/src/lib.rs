//! Load harness for the conversation gateway.
//!
//! Issues a fixed number of requests at a fixed pace, lets them overlap,
//! and summarizes how they ended by status.

pub mod aggregator;
pub mod cli;
pub mod error;
pub mod harness;
pub mod pacer;
pub mod task;
pub mod transport;

pub use aggregator::{OutcomeAggregator, OutcomeRecord, OutcomeStatus, OutcomeSummary};
pub use cli::Cli;
pub use error::{HarnessError, Result};
pub use harness::{HarnessConfig, HarnessReport, LoadHarness};
pub use pacer::{LoadLevel, LoadPacer};
pub use task::{LoadTask, PayloadShape, TaskPayload};
pub use transport::{HttpTransport, LoadTransport};
