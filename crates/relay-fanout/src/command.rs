//! Broadcast commands
//!
//! The unit exchanged between nodes. Commands reference rooms and
//! connections by key/id only; they cross process boundaries.

use crate::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a replicated delivery should land on the receiving node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastTarget {
    /// Every local member of the room
    Room(String),
    /// A single connection, if it lives on the receiving node
    Connection(String),
}

/// A "deliver to room/connection" command replicated to every node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastCommand {
    /// Node that already performed the local delivery before publishing
    pub origin: NodeId,
    /// Delivery target on the receiving node
    pub target: BroadcastTarget,
    /// Outbound event name
    pub event_name: String,
    /// Opaque event payload
    pub payload: Value,
    /// Session excluded from delivery (exclusive mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_session: Option<String>,
}

impl BroadcastCommand {
    /// Build an inclusive room command
    #[must_use]
    pub fn room(origin: NodeId, room: impl Into<String>, event_name: impl Into<String>, payload: Value) -> Self {
        Self {
            origin,
            target: BroadcastTarget::Room(room.into()),
            event_name: event_name.into(),
            payload,
            exclude_session: None,
        }
    }

    /// Build an exclusive room command
    #[must_use]
    pub fn room_excluding(
        origin: NodeId,
        room: impl Into<String>,
        event_name: impl Into<String>,
        payload: Value,
        exclude_session: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            target: BroadcastTarget::Room(room.into()),
            event_name: event_name.into(),
            payload,
            exclude_session: Some(exclude_session.into()),
        }
    }

    /// Build a single-connection command
    #[must_use]
    pub fn direct(
        origin: NodeId,
        connection_id: impl Into<String>,
        event_name: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            origin,
            target: BroadcastTarget::Connection(connection_id.into()),
            event_name: event_name.into(),
            payload,
            exclude_session: None,
        }
    }

    /// Whether this command originated on the given node
    ///
    /// A node receiving its own command must discard it; it already
    /// delivered locally before publishing.
    #[must_use]
    pub fn is_from(&self, node: &NodeId) -> bool {
        self.origin == *node
    }

    /// Serialize to the wire format
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from the wire format
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
