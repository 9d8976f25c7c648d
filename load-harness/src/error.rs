//! Error types for the load harness.

/// Harness configuration and setup failures. Individual request failures
/// are outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Unknown load level '{0}' (expected one of: {1})")]
    UnknownLoadLevel(String, String),

    #[error("Pacing interval must be greater than zero")]
    ZeroInterval,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
