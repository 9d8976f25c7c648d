//! Backend target resolution.

use std::fmt;

use thiserror::Error;

use crate::config::{BackendsConfig, EndpointConfig};

/// Errors from backend resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("Missing configuration entry: {0}")]
    ConfigurationMissing(String),
}

/// Logical backend environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Mock,
    Dev,
    Live,
}

impl BackendKind {
    /// Parse a target type. Anything unrecognized selects `Live`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "mock" => BackendKind::Mock,
            "dev" => BackendKind::Dev,
            "live" => BackendKind::Live,
            other => {
                tracing::warn!(
                    target_type = %other,
                    "Unrecognized backend target type, falling back to live"
                );
                BackendKind::Live
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Mock => "mock",
            BackendKind::Dev => "dev",
            BackendKind::Live => "live",
        }
    }

    fn endpoint(self, config: &BackendsConfig) -> Option<&EndpointConfig> {
        match self {
            BackendKind::Mock => config.mock.as_ref(),
            BackendKind::Dev => config.dev.as_ref(),
            BackendKind::Live => config.live.as_ref(),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete backend endpoint plus the credential to call it with.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub kind: BackendKind,
    pub base_url: String,
    pub auth_token: String,
}

impl fmt::Debug for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendTarget")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Resolve `target_type` to a backend endpoint using `config`.
pub fn resolve(target_type: &str, config: &BackendsConfig) -> Result<BackendTarget, RouterError> {
    let kind = BackendKind::parse(target_type);
    let endpoint = kind.endpoint(config);

    let base_url = endpoint
        .and_then(|e| e.base_url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| RouterError::ConfigurationMissing(format!("backend.{}.base_url", kind)))?;

    let auth_token = endpoint
        .and_then(|e| e.auth_token.as_deref())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| RouterError::ConfigurationMissing(format!("backend.{}.auth_token", kind)))?;

    Ok(BackendTarget {
        kind,
        base_url: base_url.trim_end_matches('/').to_string(),
        auth_token: auth_token.to_string(),
    })
}
