//! `authenticatedMessage` handler

use super::{check_message_length, parse_payload};
use crate::auth::with_auth;
use crate::protocol::{AuthenticatedMessageRequest, ClientEventType, EventFrame};
use crate::server::GatewayState;
use crate::session::Session;
use relay_common::GatewayResult;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct AuthenticatedMessageHandler;

impl AuthenticatedMessageHandler {
    /// Accept a message only from a connection that passes the auth gate
    pub async fn handle(
        state: &GatewayState,
        session: &Arc<Session>,
        data: Value,
    ) -> GatewayResult<Option<EventFrame>> {
        with_auth(state.auth(), session, || async move {
            let request: AuthenticatedMessageRequest = parse_payload(data)?;
            check_message_length(state, &request.message)?;

            tracing::info!(
                session_id = %session.session_id(),
                "Authenticated message accepted"
            );

            Ok(Some(EventFrame::ack(json!({
                "request": ClientEventType::AuthenticatedMessage.as_str(),
                "accepted": true,
            }))))
        })
        .await
    }
}
