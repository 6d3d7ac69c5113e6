//! `roomMessage` handler

use super::{check_message_length, parse_payload};
use crate::protocol::{
    ClientEventType, EventFrame, EventType, RoomKey, RoomMessagePayload, RoomMessageRequest,
};
use crate::server::GatewayState;
use crate::session::Session;
use chrono::Utc;
use relay_common::GatewayResult;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct RoomMessageHandler;

impl RoomMessageHandler {
    /// Deliver a chat message to every member of a room, sender included
    ///
    /// The timestamp is assigned here, not by the client.
    pub async fn handle(
        state: &GatewayState,
        session: &Arc<Session>,
        data: Value,
    ) -> GatewayResult<Option<EventFrame>> {
        let request: RoomMessageRequest = parse_payload(data)?;
        let room = RoomKey::parse(&request.room)?;
        check_message_length(state, &request.message)?;

        let payload = RoomMessagePayload {
            username: session.display_name().await,
            room: room.as_str().to_string(),
            message: request.message,
            timestamp: Utc::now().to_rfc3339(),
        };

        let delivered = state
            .broadcaster()
            .broadcast_inclusive(
                room.as_str(),
                EventType::RoomMessage.as_str(),
                serde_json::to_value(&payload).unwrap_or_default(),
            )
            .await;

        Ok(Some(EventFrame::ack(json!({
            "request": ClientEventType::RoomMessage.as_str(),
            "room": room.as_str(),
            "delivered": delivered,
        }))))
    }
}
