//! Room broadcast primitives
//!
//! Every broadcast is performed against this node's registry first and
//! then published as a `BroadcastCommand` so the rest of the cluster can
//! apply the equivalent local-only delivery. Publish failures degrade to
//! single-node behavior; they are logged and never propagate.

use crate::protocol::{EventFrame, RoomKey};
use crate::session::SessionRegistry;
use relay_common::GatewayResult;
use relay_fanout::{BroadcastCommand, BroadcastTarget, CommandPublisher, NodeId};
use serde_json::Value;
use std::sync::Arc;

/// Delivers events to rooms and single connections, locally and
/// cluster-wide
pub struct Broadcaster {
    /// This node's identity; the origin tag on every published command
    node: NodeId,
    registry: Arc<SessionRegistry>,
    publisher: Arc<dyn CommandPublisher>,
}

impl Broadcaster {
    /// Create a new broadcaster
    pub fn new(
        node: NodeId,
        registry: Arc<SessionRegistry>,
        publisher: Arc<dyn CommandPublisher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            node,
            registry,
            publisher,
        })
    }

    /// Get this node's id
    pub fn node_id(&self) -> &NodeId {
        &self.node
    }

    /// Deliver to every member of a room, sender included
    ///
    /// Returns the number of local deliveries.
    pub async fn broadcast_inclusive(&self, room: &str, event_name: &str, payload: Value) -> usize {
        let frame = EventFrame::new(event_name, payload.clone());
        let sent = self.registry.send_to_room(room, &frame, None).await;

        self.replicate(BroadcastCommand::room(
            self.node.clone(),
            room,
            event_name,
            payload,
        ))
        .await;

        sent
    }

    /// Deliver to every member of a room except one session
    ///
    /// Used for ephemeral signals where echoing back to the originator
    /// is meaningless.
    pub async fn broadcast_exclusive(
        &self,
        room: &str,
        event_name: &str,
        payload: Value,
        exclude_session: &str,
    ) -> usize {
        let frame = EventFrame::new(event_name, payload.clone());
        let sent = self
            .registry
            .send_to_room(room, &frame, Some(exclude_session))
            .await;

        self.replicate(BroadcastCommand::room_excluding(
            self.node.clone(),
            room,
            event_name,
            payload,
            exclude_session,
        ))
        .await;

        sent
    }

    /// Deliver to a single connection
    ///
    /// Returns whether the target was reachable on this node. The
    /// command is still replicated when it was not, so a node that does
    /// hold the connection can deliver it; the caller decides how to
    /// surface the local miss.
    pub async fn send_to_connection(
        &self,
        connection_id: &str,
        event_name: &str,
        payload: Value,
    ) -> bool {
        let frame = EventFrame::new(event_name, payload.clone());
        let delivered = self
            .registry
            .send_to_connection(connection_id, frame)
            .await;

        if !delivered {
            self.replicate(BroadcastCommand::direct(
                self.node.clone(),
                connection_id,
                event_name,
                payload,
            ))
            .await;
        }

        delivered
    }

    /// Collaborator-facing entry point: push an event into a room
    ///
    /// Exactly an inclusive broadcast plus cluster fan-out, with the
    /// room key validated first. Out-of-scope services use this without
    /// transport-level access.
    pub async fn broadcast_to_room(
        &self,
        room: &str,
        event_name: &str,
        payload: Value,
    ) -> GatewayResult<usize> {
        let room = RoomKey::parse(room)?;
        Ok(self
            .broadcast_inclusive(room.as_str(), event_name, payload)
            .await)
    }

    /// Apply a command received from another node
    ///
    /// Own-origin commands are discarded: this node already delivered
    /// locally before publishing. Remote commands are applied as
    /// local-only deliveries and never re-published.
    pub async fn apply(&self, command: BroadcastCommand) {
        if command.is_from(&self.node) {
            tracing::trace!(event_name = %command.event_name, "Ignoring own broadcast command");
            return;
        }

        let frame = EventFrame::new(command.event_name.clone(), command.payload);

        match command.target {
            BroadcastTarget::Room(room) => {
                let sent = self
                    .registry
                    .send_to_room(&room, &frame, command.exclude_session.as_deref())
                    .await;
                tracing::trace!(
                    room = %room,
                    event_name = %command.event_name,
                    sent = sent,
                    "Applied remote room broadcast"
                );
            }
            BroadcastTarget::Connection(connection_id) => {
                let delivered = self.registry.send_to_connection(&connection_id, frame).await;
                tracing::trace!(
                    connection_id = %connection_id,
                    delivered = delivered,
                    "Applied remote direct delivery"
                );
            }
        }
    }

    async fn replicate(&self, command: BroadcastCommand) {
        if let Err(e) = self.publisher.publish(&command).await {
            tracing::warn!(
                error = %e,
                event_name = %command.event_name,
                "Fan-out publish failed, broadcast stays local"
            );
        }
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}
