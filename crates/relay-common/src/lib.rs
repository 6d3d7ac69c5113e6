//! # relay-common
//!
//! Shared utilities for the relay gateway: configuration loading,
//! the error taxonomy, and telemetry setup.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AuthConfig, BrokerConfig, ConfigError, CorsConfig, GatewayConfig, LimitsConfig, PingConfig,
    ServerConfig, SessionConfig,
};
pub use error::{ErrorAck, GatewayError, GatewayResult};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
