//! Configuration for the conversation gateway.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendsConfig,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub messages: MessagesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Prediction backends and how to reach them.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendsConfig {
    /// Which backend to forward to: "mock", "dev" or "live".
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Whole-request deadline per backend call, connect included. Must
    /// exceed the connect timeout.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default)]
    pub mock: Option<EndpointConfig>,
    #[serde(default)]
    pub dev: Option<EndpointConfig>,
    #[serde(default)]
    pub live: Option<EndpointConfig>,
}

impl BackendsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            mock: None,
            dev: None,
            live: None,
        }
    }
}

/// Base URL and bearer token of one backend environment.
///
/// Both entries are optional here; the backend router reports which one is
/// missing when the environment is selected.
#[derive(Clone, Deserialize, Default)]
pub struct EndpointConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            auth_token: Some(auth_token.into()),
        }
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Gateway behaviour switches.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Forward request metadata to the backend. When off, metadata is
    /// dropped unread, whatever its shape.
    #[serde(default = "default_true")]
    pub supports_metadata: bool,
    /// How long `GET /hello` sleeps before answering.
    #[serde(default = "default_hello_delay")]
    pub hello_delay_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            supports_metadata: default_true(),
            hello_delay_secs: default_hello_delay(),
        }
    }
}

/// Caller-facing error texts.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "default_null_value_error")]
    pub null_value_error: String,
    #[serde(default = "default_invalid_json_message")]
    pub invalid_json_message: String,
    #[serde(default = "default_internal_server_error")]
    pub internal_server_error: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            null_value_error: default_null_value_error(),
            invalid_json_message: default_invalid_json_message(),
            internal_server_error: default_internal_server_error(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_target() -> String {
    "live".to_string()
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    120
}
fn default_true() -> bool {
    true
}
fn default_hello_delay() -> u64 {
    5
}
fn default_null_value_error() -> String {
    "message, conversationId and messageId must not be null or empty".to_string()
}
fn default_invalid_json_message() -> String {
    "request body is not a valid conversation request".to_string()
}
fn default_internal_server_error() -> String {
    "internal server error, please try again later".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Read timeout ({read}s) must be longer than connect timeout ({connect}s)")]
    InvalidTimeouts { connect: u64, read: u64 },
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (GATEWAY__SECTION__KEY format)
    /// 2. The file named by `GATEWAY_CONFIG`, or config.toml if present
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("GATEWAY_CONFIG") {
            Ok(path) => Self::load_from(Some(Path::new(&path))),
            Err(_) => Self::load_from(None),
        }
    }

    /// Load configuration, reading `path` (required) instead of the optional
    /// config.toml when given.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("config").required(false),
        };

        let config: Config = ConfigLoader::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let connect = self.backend.connect_timeout_secs;
        let read = self.backend.read_timeout_secs;
        if read <= connect {
            return Err(ConfigError::InvalidTimeouts { connect, read });
        }
        Ok(())
    }
}
