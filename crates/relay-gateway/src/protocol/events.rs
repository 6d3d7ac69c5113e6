//! Outbound event types and payloads
//!
//! Events sent node → client. Field names follow the client-facing
//! camelCase convention.

use serde::{Deserialize, Serialize};

/// Outbound event names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Welcome,
    UserConnected,
    UserDisconnected,
    UserJoinedRoom,
    UserLeftRoom,
    RoomMessage,
    PrivateMessage,
    Reconnected,
    OnlineUsers,
    Typing,
}

impl EventType {
    /// Get the wire name of this event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::UserConnected => "userConnected",
            Self::UserDisconnected => "userDisconnected",
            Self::UserJoinedRoom => "userJoinedRoom",
            Self::UserLeftRoom => "userLeftRoom",
            Self::RoomMessage => "roomMessage",
            Self::PrivateMessage => "privateMessage",
            Self::Reconnected => "reconnected",
            Self::OnlineUsers => "onlineUsers",
            Self::Typing => "chat:typing",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sent to a client right after it connects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomePayload {
    pub message: String,
    pub connected_users: usize,
}

/// Sent to existing clients when a new client connects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConnectedPayload {
    pub username: String,
    pub total_users: usize,
}

/// Sent to all clients once a departed session's grace window expires
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDisconnectedPayload {
    pub username: String,
    pub total_users: usize,
}

/// Sent to room members when someone joins their room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedRoomPayload {
    pub username: String,
    pub room: String,
}

/// Sent to room members when someone leaves their room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftRoomPayload {
    pub username: String,
    pub room: String,
}

/// A chat message delivered to every member of a room, sender included
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessagePayload {
    pub username: String,
    pub room: String,
    pub message: String,
    /// RFC 3339 timestamp assigned by the receiving node
    pub timestamp: String,
}

/// A direct message delivered to a single connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    pub from: String,
    pub message: String,
    pub timestamp: String,
}

/// Ephemeral typing indicator, never echoed to its sender
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub username: String,
    pub conversation_id: String,
    pub is_typing: bool,
}

/// Sent to a client that resumed within its grace window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectedPayload {
    /// Room memberships preserved across the reconnect
    pub rooms: Vec<String>,
}

/// One entry in the local-node online snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUserPayload {
    pub session_id: String,
    pub display_name: String,
    pub rooms: Vec<String>,
}

/// Local-node answer to a presence query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsersPayload {
    pub users: Vec<OnlineUserPayload>,
}

/// One entry in a "who's here" room snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMemberPayload {
    pub session_id: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(EventType::Welcome.as_str(), "welcome");
        assert_eq!(EventType::UserJoinedRoom.as_str(), "userJoinedRoom");
        assert_eq!(EventType::Typing.as_str(), "chat:typing");
    }

    #[test]
    fn test_camel_case_fields() {
        let payload = WelcomePayload {
            message: "Welcome alice!".to_string(),
            connected_users: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["message"], "Welcome alice!");
        assert_eq!(json["connectedUsers"], 1);
    }

    #[test]
    fn test_typing_payload_fields() {
        let payload = TypingPayload {
            username: "alice".to_string(),
            conversation_id: "chat:1".to_string(),
            is_typing: true,
        };
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["conversationId"], "chat:1");
        assert_eq!(json["isTyping"], true);
    }
}
