//! Inbound event types and request payloads
//!
//! Events sent client → node. Each request payload is validated by its
//! handler before any other component is touched.

use serde::Deserialize;

/// Inbound event names the gateway accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEventType {
    JoinRoom,
    LeaveRoom,
    RoomMessage,
    PrivateMessage,
    GetOnlineUsers,
    AuthenticatedMessage,
    Typing,
}

impl ClientEventType {
    /// Parse a wire event name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "joinRoom" => Some(Self::JoinRoom),
            "leaveRoom" => Some(Self::LeaveRoom),
            "roomMessage" => Some(Self::RoomMessage),
            "privateMessage" => Some(Self::PrivateMessage),
            "getOnlineUsers" => Some(Self::GetOnlineUsers),
            "authenticatedMessage" => Some(Self::AuthenticatedMessage),
            "chat:typing" => Some(Self::Typing),
            _ => None,
        }
    }

    /// Get the wire name of this event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoinRoom => "joinRoom",
            Self::LeaveRoom => "leaveRoom",
            Self::RoomMessage => "roomMessage",
            Self::PrivateMessage => "privateMessage",
            Self::GetOnlineUsers => "getOnlineUsers",
            Self::AuthenticatedMessage => "authenticatedMessage",
            Self::Typing => "chat:typing",
        }
    }
}

/// `joinRoom` request
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomRequest {
    pub room: String,
}

/// `leaveRoom` request
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRoomRequest {
    pub room: String,
}

/// `roomMessage` request
#[derive(Debug, Clone, Deserialize)]
pub struct RoomMessageRequest {
    pub room: String,
    pub message: String,
}

/// `privateMessage` request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessageRequest {
    pub target_id: String,
    pub message: String,
}

/// `authenticatedMessage` request
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedMessageRequest {
    pub message: String,
}

/// `chat:typing` request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub conversation_id: String,
    pub is_typing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_names() {
        assert_eq!(ClientEventType::parse("joinRoom"), Some(ClientEventType::JoinRoom));
        assert_eq!(
            ClientEventType::parse("chat:typing"),
            Some(ClientEventType::Typing)
        );
        assert_eq!(ClientEventType::parse("welcome"), None);
        assert_eq!(ClientEventType::parse(""), None);
    }

    #[test]
    fn test_parse_roundtrip() {
        for kind in [
            ClientEventType::JoinRoom,
            ClientEventType::LeaveRoom,
            ClientEventType::RoomMessage,
            ClientEventType::PrivateMessage,
            ClientEventType::GetOnlineUsers,
            ClientEventType::AuthenticatedMessage,
            ClientEventType::Typing,
        ] {
            assert_eq!(ClientEventType::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_private_message_request_fields() {
        let req: PrivateMessageRequest =
            serde_json::from_value(serde_json::json!({"targetId": "conn-1", "message": "hi"}))
                .unwrap();
        assert_eq!(req.target_id, "conn-1");
        assert_eq!(req.message, "hi");
    }

    #[test]
    fn test_typing_request_fields() {
        let req: TypingRequest =
            serde_json::from_value(serde_json::json!({"conversationId": "chat:1", "isTyping": false}))
                .unwrap();
        assert_eq!(req.conversation_id, "chat:1");
        assert!(!req.is_typing);
    }
}
