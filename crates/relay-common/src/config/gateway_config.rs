//! Gateway configuration structs
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;

/// Top-level gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub ping: PingConfig,
    pub session: SessionConfig,
    pub limits: LimitsConfig,
    pub auth: AuthConfig,
    pub broker: BrokerConfig,
}

/// Bind address for the gateway server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Idle-ping configuration for client liveness
#[derive(Debug, Clone, Deserialize)]
pub struct PingConfig {
    #[serde(default = "default_ping_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_ping_timeout_ms")]
    pub timeout_ms: u64,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// How long a disconnected session is preserved awaiting reconnection
    #[serde(default = "default_grace_ms")]
    pub reconnect_grace_ms: u64,
}

/// Payload limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum message length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

/// Auth gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret checked against the handshake token
    pub shared_secret: String,
}

/// Fan-out broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_url")]
    pub url: String,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4100
}

fn default_ping_interval_ms() -> u64 {
    25_000
}

fn default_ping_timeout_ms() -> u64 {
    60_000
}

fn default_grace_ms() -> u64 {
    30_000
}

fn default_max_message_length() -> usize {
    10_000
}

fn default_broker_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Read and parse an optional environment variable
///
/// A variable that is set but malformed is a hard error, not a silent
/// fall-back to the default.
fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(None),
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or
    /// a set variable fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            server: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("GATEWAY_PORT")?.unwrap_or_else(default_port),
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .ok()
                    .map(|s| s.split(',').map(str::trim).map(String::from).collect())
                    .unwrap_or_default(),
            },
            ping: PingConfig {
                interval_ms: parse_var("PING_INTERVAL_MS")?
                    .unwrap_or_else(default_ping_interval_ms),
                timeout_ms: parse_var("PING_TIMEOUT_MS")?.unwrap_or_else(default_ping_timeout_ms),
            },
            session: SessionConfig {
                reconnect_grace_ms: parse_var("RECONNECT_GRACE_MS")?
                    .unwrap_or_else(default_grace_ms),
            },
            limits: LimitsConfig {
                max_message_length: parse_var("MAX_MESSAGE_LENGTH")?
                    .unwrap_or_else(default_max_message_length),
            },
            auth: AuthConfig {
                shared_secret: env::var("GATEWAY_SHARED_SECRET")
                    .map_err(|_| ConfigError::MissingVar("GATEWAY_SHARED_SECRET"))?,
            },
            broker: BrokerConfig {
                url: env::var("BROKER_URL").unwrap_or_else(|_| default_broker_url()),
            },
        })
    }

    /// A configuration suitable for tests: short grace, no broker expectations
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: 0,
            },
            cors: CorsConfig::default(),
            ping: PingConfig {
                interval_ms: default_ping_interval_ms(),
                timeout_ms: default_ping_timeout_ms(),
            },
            session: SessionConfig {
                reconnect_grace_ms: 50,
            },
            limits: LimitsConfig {
                max_message_length: default_max_message_length(),
            },
            auth: AuthConfig {
                shared_secret: "test-secret".to_string(),
            },
            broker: BrokerConfig {
                url: default_broker_url(),
            },
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
