//! WebSocket handler
//!
//! Accepts upgraded connections, binds them to sessions, and pumps
//! frames between the transport and the handler layer.

use crate::handlers;
use crate::protocol::{EventFrame, EventType, ReconnectedPayload, UserConnectedPayload, WelcomePayload};
use crate::server::GatewayState;
use crate::session::ConnectOutcome;
use axum::{
    extract::{ws::Message, Query, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use uuid::Uuid;

/// Channel buffer size for outgoing frames
const FRAME_BUFFER_SIZE: usize = 256;

/// Handshake query parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    /// Display name claimed for this session
    #[serde(default = "default_username")]
    pub username: String,

    /// Stable identity for resuming across reconnects
    pub session_id: Option<String>,

    /// Shared-secret token for protected operations
    pub token: Option<String>,
}

fn default_username() -> String {
    "anonymous".to_string()
}

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, params, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(
    state: GatewayState,
    params: ConnectParams,
    socket: axum::extract::ws::WebSocket,
) {
    let connection_id = Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::channel::<EventFrame>(FRAME_BUFFER_SIZE);

    let outcome = state
        .registry()
        .on_connect(
            connection_id.clone(),
            params.username,
            params.session_id,
            params.token,
            tx,
        )
        .await;
    let session = outcome.session.clone();

    tracing::info!(
        connection_id = %connection_id,
        session_id = %session.session_id(),
        resumed = outcome.resumed,
        "WebSocket connection established"
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    establish_session(&state, &outcome).await;

    // Send task: outgoing frames, plus idle pings for liveness
    let ping_interval = Duration::from_millis(state.config().ping.interval_ms);
    let connection_id_send = connection_id.clone();
    let send_task = tokio::spawn(async move {
        let mut ping = interval(ping_interval);
        ping.tick().await; // first tick fires immediately

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else { break };
                    let Ok(json) = frame.to_json() else { continue };
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::debug!(
                            connection_id = %connection_id_send,
                            "Failed to send frame, transport gone"
                        );
                        break;
                    }
                }
                _ = ping.tick() => {
                    if ws_sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    // Receive task: inbound frames go through the dispatcher; a frame
    // that fails to parse gets an error ack, never a close.
    let state_recv = state.clone();
    let session_recv = session.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    session_recv.touch().await;
                    match EventFrame::from_json(&text) {
                        Ok(frame) => {
                            handlers::dispatch(&state_recv, &session_recv, frame).await;
                        }
                        Err(e) => {
                            tracing::debug!(
                                session_id = %session_recv.session_id(),
                                error = %e,
                                "Malformed frame"
                            );
                            let err = relay_common::GatewayError::validation("malformed frame");
                            let ack = relay_common::ErrorAck::from(&err);
                            session_recv.send(EventFrame::error(&ack)).await;
                        }
                    }
                }
                Ok(Message::Pong(_)) => {
                    session_recv.touch().await;
                }
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by axum
                    session_recv.touch().await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        session_id = %session_recv.session_id(),
                        "Binary frames not supported"
                    );
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(
                        session_id = %session_recv.session_id(),
                        "Client closed connection"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_recv.session_id(),
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
            }
        }
    });

    // Liveness task: a transport that stops answering pings is dead
    let ping_timeout = Duration::from_millis(state.config().ping.timeout_ms);
    let session_live = session.clone();
    let liveness_task = tokio::spawn(async move {
        let mut check = interval(ping_timeout / 2);

        loop {
            check.tick().await;
            let idle = session_live.idle_ms().await;
            if idle > ping_timeout.as_millis() as i64 {
                tracing::warn!(
                    session_id = %session_live.session_id(),
                    idle_ms = idle,
                    "Connection timed out"
                );
                break;
            }
        }
    });

    tokio::select! {
        _ = recv_task => {}
        _ = send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
        }
        _ = liveness_task => {}
    }

    close_connection(&state, &connection_id).await;
}

/// Greet a freshly bound session and announce it to the node
///
/// A resumed session gets its preserved room list back instead of a
/// fresh welcome; the rest of the node hears nothing, the user never
/// left.
pub async fn establish_session(state: &GatewayState, outcome: &ConnectOutcome) {
    let session = &outcome.session;
    let username = session.display_name().await;

    if outcome.resumed {
        let payload = ReconnectedPayload {
            rooms: session.rooms().await,
        };
        session
            .send(EventFrame::from_payload(
                EventType::Reconnected.as_str(),
                &payload,
            ))
            .await;
        return;
    }

    let total = state.registry().active_count().await;

    let welcome = WelcomePayload {
        message: format!("Welcome {username}!"),
        connected_users: total,
    };
    session
        .send(EventFrame::from_payload(EventType::Welcome.as_str(), &welcome))
        .await;

    let announce = UserConnectedPayload {
        username,
        total_users: total,
    };
    state
        .registry()
        .broadcast_all(
            &EventFrame::from_payload(EventType::UserConnected.as_str(), &announce),
            Some(session.session_id()),
        )
        .await;
}

/// Tear down a closed transport
///
/// The session is not removed; it enters its grace window and the
/// expiry timer is armed.
pub async fn close_connection(state: &GatewayState, connection_id: &str) {
    if let Some(session) = state.registry().on_disconnect(connection_id).await {
        state.grace().arm(&session);
        tracing::info!(
            connection_id = %connection_id,
            session_id = %session.session_id(),
            "Connection closed, session awaiting reconnect"
        );
    }
}
