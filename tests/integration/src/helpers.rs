//! Test helpers for integration tests
//!
//! Builds fully wired gateway nodes whose fan-out goes over an
//! in-process channel instead of a real broker. Commands published by
//! one node reach every node on the same bus, including the origin,
//! which exercises the origin-discard path exactly like production.

use relay_common::GatewayConfig;
use relay_fanout::{BroadcastCommand, CommandPublisher, FanoutError, FanoutResult, NodeId};
use relay_gateway::auth::AuthGate;
use relay_gateway::broadcast::Broadcaster;
use relay_gateway::handlers;
use relay_gateway::protocol::EventFrame;
use relay_gateway::server::{close_connection, establish_session, GatewayState};
use relay_gateway::session::{GraceManager, Session, SessionRegistry};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Shared in-process replacement for the fan-out broker
#[derive(Clone)]
pub struct ClusterBus {
    tx: broadcast::Sender<BroadcastCommand>,
}

impl ClusterBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }
}

impl Default for ClusterBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Publisher that writes to the cluster bus
struct ChannelPublisher {
    tx: broadcast::Sender<BroadcastCommand>,
}

#[async_trait::async_trait]
impl CommandPublisher for ChannelPublisher {
    async fn publish(&self, command: &BroadcastCommand) -> FanoutResult<()> {
        self.tx
            .send(command.clone())
            .map_err(|_| FanoutError::ChannelClosed)?;
        Ok(())
    }
}

/// One gateway node wired to a cluster bus
pub struct TestNode {
    state: GatewayState,
}

impl TestNode {
    /// Bring up a node and attach it to the bus
    ///
    /// Uses the test configuration: 50ms grace window, shared secret
    /// "test-secret".
    pub fn join(bus: &ClusterBus, node_id: &str) -> Self {
        let config = Arc::new(GatewayConfig::for_tests());
        let registry = SessionRegistry::new_shared();
        let broadcaster = Broadcaster::new(
            NodeId::from(node_id),
            registry.clone(),
            Arc::new(ChannelPublisher { tx: bus.tx.clone() }),
        );

        // Stand-in for the fan-out listener loop
        let mut bus_rx = bus.tx.subscribe();
        let apply_target = broadcaster.clone();
        tokio::spawn(async move {
            while let Ok(command) = bus_rx.recv().await {
                apply_target.apply(command).await;
            }
        });

        let grace = GraceManager::new(
            registry.clone(),
            broadcaster.clone(),
            Duration::from_millis(config.session.reconnect_grace_ms),
        );
        let auth = AuthGate::new(config.auth.shared_secret.clone());

        Self {
            state: GatewayState::new(config, registry, broadcaster, grace, auth),
        }
    }

    /// A node with no cluster attached
    pub fn standalone(node_id: &str) -> Self {
        Self::join(&ClusterBus::new(), node_id)
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Connect a client, running the full session-establishment flow
    pub async fn connect(
        &self,
        connection_id: &str,
        username: &str,
        identity: Option<&str>,
        token: Option<&str>,
    ) -> (Arc<Session>, mpsc::Receiver<EventFrame>) {
        let (tx, rx) = mpsc::channel(64);
        let outcome = self
            .state
            .registry()
            .on_connect(
                connection_id.to_string(),
                username.to_string(),
                identity.map(String::from),
                token.map(String::from),
                tx,
            )
            .await;
        establish_session(&self.state, &outcome).await;
        (outcome.session, rx)
    }

    /// Send one inbound frame through the dispatcher
    pub async fn send(&self, session: &Arc<Session>, event: &str, data: Value) {
        handlers::dispatch(&self.state, session, EventFrame::new(event, data)).await;
        // Let the bus apply tasks on the other nodes run
        tokio::task::yield_now().await;
    }

    /// Drop a client's transport, entering the grace window
    pub async fn disconnect(&self, connection_id: &str) {
        close_connection(&self.state, connection_id).await;
    }
}

/// Receive the next frame or panic after a timeout
pub async fn next_frame(rx: &mut mpsc::Receiver<EventFrame>) -> EventFrame {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("frame channel closed")
}

/// Assert that nothing arrives within a settling period
pub async fn assert_silent(rx: &mut mpsc::Receiver<EventFrame>) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Ok(frame) = rx.try_recv() {
        panic!("expected silence, got {frame}");
    }
}

/// Drain frames until one with the given event name arrives
pub async fn frame_of(rx: &mut mpsc::Receiver<EventFrame>, event: &str) -> EventFrame {
    for _ in 0..16 {
        let frame = next_frame(rx).await;
        if frame.event == event {
            return frame;
        }
    }
    panic!("no {event} frame within 16 frames");
}
