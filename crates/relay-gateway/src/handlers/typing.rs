//! `chat:typing` handler

use super::parse_payload;
use crate::protocol::{EventFrame, EventType, RoomKey, TypingPayload, TypingRequest};
use crate::server::GatewayState;
use crate::session::Session;
use relay_common::GatewayResult;
use serde_json::Value;
use std::sync::Arc;

pub struct TypingHandler;

impl TypingHandler {
    /// Relay an ephemeral typing indicator to the conversation, never
    /// back to its sender
    ///
    /// No ack: typing signals are fire-and-forget.
    pub async fn handle(
        state: &GatewayState,
        session: &Arc<Session>,
        data: Value,
    ) -> GatewayResult<Option<EventFrame>> {
        let request: TypingRequest = parse_payload(data)?;
        let conversation = RoomKey::parse(&request.conversation_id)?;

        let payload = TypingPayload {
            username: session.display_name().await,
            conversation_id: conversation.as_str().to_string(),
            is_typing: request.is_typing,
        };

        state
            .broadcaster()
            .broadcast_exclusive(
                conversation.as_str(),
                EventType::Typing.as_str(),
                serde_json::to_value(&payload).unwrap_or_default(),
                session.session_id(),
            )
            .await;

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{connect, make_state, next_frame};
    use super::super::dispatch;
    use crate::protocol::EventFrame;
    use serde_json::json;

    #[tokio::test]
    async fn test_typing_reaches_peers_never_sender() {
        let state = make_state();
        let (alice, mut alice_rx) = connect(&state, "conn-a", "alice", None).await;
        let (bob, mut bob_rx) = connect(&state, "conn-b", "bob", None).await;

        for session in [&alice, &bob] {
            dispatch(
                &state,
                session,
                EventFrame::new("joinRoom", json!({"room": "chat:1"})),
            )
            .await;
        }
        next_frame(&mut alice_rx).await; // ack
        next_frame(&mut alice_rx).await; // bob joined
        next_frame(&mut bob_rx).await; // ack

        dispatch(
            &state,
            &alice,
            EventFrame::new(
                "chat:typing",
                json!({"conversationId": "chat:1", "isTyping": true}),
            ),
        )
        .await;

        let frame = next_frame(&mut bob_rx).await;
        assert_eq!(frame.event, "chat:typing");
        assert_eq!(frame.data["username"], "alice");
        assert_eq!(frame.data["isTyping"], true);

        // No echo, no ack
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_conversation_rejected() {
        let state = make_state();
        let (alice, mut alice_rx) = connect(&state, "conn-a", "alice", None).await;

        dispatch(
            &state,
            &alice,
            EventFrame::new(
                "chat:typing",
                json!({"conversationId": "", "isTyping": true}),
            ),
        )
        .await;

        let frame = next_frame(&mut alice_rx).await;
        assert_eq!(frame.event, "error");
        assert_eq!(frame.data["code"], "VALIDATION_ERROR");
    }
}
