//! `leaveRoom` handler

use super::parse_payload;
use crate::protocol::{
    ClientEventType, EventFrame, EventType, LeaveRoomRequest, RoomKey, UserLeftRoomPayload,
};
use crate::server::GatewayState;
use crate::session::Session;
use relay_common::GatewayResult;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct LeaveRoomHandler;

impl LeaveRoomHandler {
    /// Remove the session from a room and announce to the remaining
    /// members
    ///
    /// Leaving a room the session never joined is a silent no-op apart
    /// from the ack.
    pub async fn handle(
        state: &GatewayState,
        session: &Arc<Session>,
        data: Value,
    ) -> GatewayResult<Option<EventFrame>> {
        let request: LeaveRoomRequest = parse_payload(data)?;
        let room = RoomKey::parse(&request.room)?;

        let was_member = state.registry().leave_room(session, room.as_str()).await;

        if was_member {
            let payload = UserLeftRoomPayload {
                username: session.display_name().await,
                room: room.as_str().to_string(),
            };
            state
                .broadcaster()
                .broadcast_exclusive(
                    room.as_str(),
                    EventType::UserLeftRoom.as_str(),
                    serde_json::to_value(&payload).unwrap_or_default(),
                    session.session_id(),
                )
                .await;
        }

        Ok(Some(EventFrame::ack(json!({
            "request": ClientEventType::LeaveRoom.as_str(),
            "room": room.as_str(),
            "left": was_member,
        }))))
    }
}
