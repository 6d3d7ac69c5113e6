//! Configuration loading

mod gateway_config;

pub use gateway_config::{
    AuthConfig, BrokerConfig, ConfigError, CorsConfig, GatewayConfig, LimitsConfig, PingConfig,
    ServerConfig, SessionConfig,
};
