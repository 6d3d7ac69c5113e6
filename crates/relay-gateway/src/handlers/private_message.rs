//! `privateMessage` handler

use super::{check_message_length, parse_payload};
use crate::protocol::{
    ClientEventType, EventFrame, EventType, PrivateMessagePayload, PrivateMessageRequest,
};
use crate::server::GatewayState;
use crate::session::Session;
use chrono::Utc;
use relay_common::{GatewayError, GatewayResult};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct PrivateMessageHandler;

impl PrivateMessageHandler {
    /// Deliver a direct message to a single target connection
    ///
    /// A local miss is acked back as unreachable; the command is still
    /// fanned out in case the target lives on another node.
    pub async fn handle(
        state: &GatewayState,
        session: &Arc<Session>,
        data: Value,
    ) -> GatewayResult<Option<EventFrame>> {
        let request: PrivateMessageRequest = parse_payload(data)?;
        if request.target_id.is_empty() {
            return Err(GatewayError::validation("targetId must not be empty"));
        }
        check_message_length(state, &request.message)?;

        let payload = PrivateMessagePayload {
            from: session.display_name().await,
            message: request.message,
            timestamp: Utc::now().to_rfc3339(),
        };

        let delivered = state
            .broadcaster()
            .send_to_connection(
                &request.target_id,
                EventType::PrivateMessage.as_str(),
                serde_json::to_value(&payload).unwrap_or_default(),
            )
            .await;

        if !delivered {
            return Err(GatewayError::unreachable(request.target_id));
        }

        Ok(Some(EventFrame::ack(json!({
            "request": ClientEventType::PrivateMessage.as_str(),
            "targetId": request.target_id,
        }))))
    }
}
