//! Inbound event handlers
//!
//! One handler per client-initiated operation. Every handler validates
//! its own payload first; a client-fault error becomes an error
//! acknowledgment on the same connection and nothing else happens.

mod authenticated;
mod join_room;
mod leave_room;
mod presence;
mod private_message;
mod room_message;
mod typing;

pub use authenticated::AuthenticatedMessageHandler;
pub use join_room::JoinRoomHandler;
pub use leave_room::LeaveRoomHandler;
pub use presence::GetOnlineUsersHandler;
pub use private_message::PrivateMessageHandler;
pub use room_message::RoomMessageHandler;
pub use typing::TypingHandler;

use crate::protocol::{ClientEventType, EventFrame};
use crate::server::GatewayState;
use crate::session::Session;
use relay_common::{ErrorAck, GatewayError, GatewayResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Route one inbound frame to its handler
///
/// A handler's `Ok(Some(frame))` is sent back on the same connection;
/// `Err` becomes an error acknowledgment tagged with the offending event
/// name. Nothing here closes the connection.
pub async fn dispatch(state: &GatewayState, session: &Arc<Session>, frame: EventFrame) {
    let result = match ClientEventType::parse(&frame.event) {
        Some(ClientEventType::JoinRoom) => JoinRoomHandler::handle(state, session, frame.data).await,
        Some(ClientEventType::LeaveRoom) => {
            LeaveRoomHandler::handle(state, session, frame.data).await
        }
        Some(ClientEventType::RoomMessage) => {
            RoomMessageHandler::handle(state, session, frame.data).await
        }
        Some(ClientEventType::PrivateMessage) => {
            PrivateMessageHandler::handle(state, session, frame.data).await
        }
        Some(ClientEventType::GetOnlineUsers) => GetOnlineUsersHandler::handle(state).await,
        Some(ClientEventType::AuthenticatedMessage) => {
            AuthenticatedMessageHandler::handle(state, session, frame.data).await
        }
        Some(ClientEventType::Typing) => TypingHandler::handle(state, session, frame.data).await,
        None => Err(GatewayError::validation(format!(
            "unknown event: {}",
            frame.event
        ))),
    };

    match result {
        Ok(Some(reply)) => {
            session.send(reply).await;
        }
        Ok(None) => {}
        Err(err) => {
            if !err.is_client_fault() {
                tracing::error!(
                    session_id = %session.session_id(),
                    event = %frame.event,
                    error = %err,
                    "Handler failed"
                );
            }
            let ack = ErrorAck::from(&err).with_request(frame.event);
            session.send(EventFrame::error(&ack)).await;
        }
    }
}

/// Deserialize a handler's request payload
pub(crate) fn parse_payload<T: DeserializeOwned>(data: Value) -> GatewayResult<T> {
    serde_json::from_value(data).map_err(|e| GatewayError::validation(format!("invalid payload: {e}")))
}

/// Reject messages over the configured length limit
///
/// Counted in characters, not bytes.
pub(crate) fn check_message_length(state: &GatewayState, message: &str) -> GatewayResult<()> {
    if message.is_empty() {
        return Err(GatewayError::validation("message must not be empty"));
    }

    let max = state.config().limits.max_message_length;
    if message.chars().count() > max {
        return Err(GatewayError::validation(format!(
            "message exceeds {max} characters"
        )));
    }
    Ok(())
}
