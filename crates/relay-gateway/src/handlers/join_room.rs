//! `joinRoom` handler

use super::parse_payload;
use crate::protocol::{
    ClientEventType, EventFrame, EventType, JoinRoomRequest, RoomKey, UserJoinedRoomPayload,
};
use crate::server::GatewayState;
use crate::session::Session;
use relay_common::GatewayResult;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct JoinRoomHandler;

impl JoinRoomHandler {
    /// Join the session to a room, announce to the existing members, and
    /// ack with the room's member list
    ///
    /// Joining a room twice is harmless; the second join just re-acks.
    pub async fn handle(
        state: &GatewayState,
        session: &Arc<Session>,
        data: Value,
    ) -> GatewayResult<Option<EventFrame>> {
        let request: JoinRoomRequest = parse_payload(data)?;
        let room = RoomKey::parse(&request.room)?;

        let already_member = session.has_room(room.as_str()).await;
        let members = state.registry().join_room(session, &room).await;

        // Existing members only; the joiner learns about the room from
        // the ack.
        if !already_member {
            let payload = UserJoinedRoomPayload {
                username: session.display_name().await,
                room: room.as_str().to_string(),
            };
            state
                .broadcaster()
                .broadcast_exclusive(
                    room.as_str(),
                    EventType::UserJoinedRoom.as_str(),
                    serde_json::to_value(&payload).unwrap_or_default(),
                    session.session_id(),
                )
                .await;
        }

        Ok(Some(EventFrame::ack(json!({
            "request": ClientEventType::JoinRoom.as_str(),
            "room": room.as_str(),
            "members": members,
        }))))
    }
}
