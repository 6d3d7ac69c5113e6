//! Gateway error types
//!
//! Unified error handling for the relay gateway. Client-fault errors are
//! answered with an error acknowledgment on the same connection; nothing
//! in this taxonomy is fatal to the process.

use serde::Serialize;
use std::fmt;

/// Gateway-wide error type
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed, oversized or pattern-violating payload.
    /// Never causes a broadcast or state change.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Auth gate rejection. The connection stays open; only the one
    /// message is refused.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Direct message to an id not connected to this node
    #[error("Target unreachable: {0}")]
    TargetUnreachable(String),

    /// Fan-out broker unavailable. Logged at node level, never surfaced
    /// to a client.
    #[error("Infrastructure degraded: {0}")]
    Degraded(String),

    /// Internal errors (caught at the handler boundary)
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl GatewayError {
    /// Get the stable error code used in error acknowledgments
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::TargetUnreachable(_) => "TARGET_UNREACHABLE",
            Self::Degraded(_) => "INFRASTRUCTURE_DEGRADED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is the sender's fault and should be acked back
    #[must_use]
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Authentication(_) | Self::TargetUnreachable(_)
        )
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an authentication error
    #[must_use]
    pub fn authentication(msg: impl fmt::Display) -> Self {
        Self::Authentication(msg.to_string())
    }

    /// Create a target-unreachable error
    #[must_use]
    pub fn unreachable(target: impl fmt::Display) -> Self {
        Self::TargetUnreachable(target.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error acknowledgment sent back to the offending client
#[derive(Debug, Clone, Serialize)]
pub struct ErrorAck {
    pub code: String,
    pub message: String,
    /// Inbound event name that triggered the error, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

impl ErrorAck {
    #[must_use]
    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }
}

impl From<&GatewayError> for ErrorAck {
    fn from(err: &GatewayError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            request: None,
        }
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
