//! Event frame format
//!
//! Every message on the wire, in both directions, is one JSON object:
//! an event name plus an opaque data payload.

use relay_common::ErrorAck;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single framed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    /// Event name
    pub event: String,

    /// Event payload
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl EventFrame {
    /// Create a frame from an event name and raw payload
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Create a frame from a typed payload
    #[must_use]
    pub fn from_payload<T: Serialize>(event: impl Into<String>, payload: &T) -> Self {
        Self {
            event: event.into(),
            data: serde_json::to_value(payload).unwrap_or_default(),
        }
    }

    /// Create a positive acknowledgment frame
    #[must_use]
    pub fn ack(data: Value) -> Self {
        Self::new("ack", data)
    }

    /// Create an error acknowledgment frame
    #[must_use]
    pub fn error(ack: &ErrorAck) -> Self {
        Self::from_payload("error", ack)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for EventFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventFrame({})", self.event)
    }
}
