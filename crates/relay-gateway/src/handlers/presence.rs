//! `getOnlineUsers` handler

use crate::protocol::{EventFrame, EventType, OnlineUsersPayload};
use crate::server::GatewayState;
use relay_common::GatewayResult;

pub struct GetOnlineUsersHandler;

impl GetOnlineUsersHandler {
    /// Answer a presence query from this node's registry
    ///
    /// Sessions sitting in their grace window are excluded: they are
    /// preserved, not present.
    pub async fn handle(state: &GatewayState) -> GatewayResult<Option<EventFrame>> {
        let users = state.registry().list_online().await;

        Ok(Some(EventFrame::from_payload(
            EventType::OnlineUsers.as_str(),
            &OnlineUsersPayload { users },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{connect, make_state, next_frame};
    use super::super::dispatch;
    use crate::protocol::EventFrame;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_lists_active_sessions_with_rooms() {
        let state = make_state();
        let (alice, mut alice_rx) = connect(&state, "conn-a", "alice", None).await;
        let (_bob, _bob_rx) = connect(&state, "conn-b", "bob", None).await;

        dispatch(
            &state,
            &alice,
            EventFrame::new("joinRoom", json!({"room": "general"})),
        )
        .await;
        next_frame(&mut alice_rx).await;

        dispatch(&state, &alice, EventFrame::new("getOnlineUsers", Value::Null)).await;

        let frame = next_frame(&mut alice_rx).await;
        assert_eq!(frame.event, "onlineUsers");
        let users = frame.data["users"].as_array().unwrap();
        assert_eq!(users.len(), 2);

        let alice_entry = users
            .iter()
            .find(|u| u["displayName"] == "alice")
            .unwrap();
        assert_eq!(alice_entry["rooms"], json!(["general"]));
    }

    #[tokio::test]
    async fn test_grace_sessions_are_not_listed() {
        let state = make_state();
        let (alice, mut alice_rx) = connect(&state, "conn-a", "alice", None).await;
        let (_bob, bob_rx) = connect(&state, "conn-b", "bob", None).await;
        drop(bob_rx);
        state.registry().on_disconnect("conn-b").await.unwrap();

        dispatch(&state, &alice, EventFrame::new("getOnlineUsers", Value::Null)).await;

        let frame = next_frame(&mut alice_rx).await;
        let users = frame.data["users"].as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["displayName"], "alice");
    }
}
