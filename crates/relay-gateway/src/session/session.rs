//! A single logical session
//!
//! The session is the identity that survives reconnects; the transport
//! connection underneath it is ephemeral and may be swapped out while
//! the session is in its grace window.

use crate::protocol::EventFrame;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Session lifecycle state
///
/// `Active -> Grace` on disconnect, `Grace -> Active` on a reconnect
/// within the window, `Grace -> Expired` when the timer fires. `Expired`
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Grace,
    Expired,
}

/// A logical client session bound to the current transport connection
pub struct Session {
    /// Stable session id (the external identity when supplied, otherwise
    /// the first connection id)
    session_id: String,

    /// Client-supplied stable identity used for resume matching
    stable_identity: Option<String>,

    /// Display name claimed at connect time
    display_name: RwLock<String>,

    /// Current transport connection id
    connection_id: RwLock<String>,

    /// Channel to the current connection's send task
    sender: RwLock<mpsc::Sender<EventFrame>>,

    /// Shared-secret token from the handshake, if any
    handshake_token: RwLock<Option<String>>,

    /// Whether the auth gate already verified this connection
    verified: AtomicBool,

    /// Joined room keys; mirrors the registry's room index exactly
    rooms: RwLock<HashSet<String>>,

    /// Lifecycle state
    state: RwLock<SessionState>,

    /// Cancellable grace timer, present only while in `Grace`
    pending_expiry: Mutex<Option<JoinHandle<()>>>,

    /// Last inbound activity on the transport
    last_seen: RwLock<DateTime<Utc>>,

    established_at: DateTime<Utc>,
}

impl Session {
    /// Create a new active session
    pub fn new(
        session_id: String,
        connection_id: String,
        display_name: String,
        stable_identity: Option<String>,
        handshake_token: Option<String>,
        sender: mpsc::Sender<EventFrame>,
    ) -> Arc<Self> {
        let now = Utc::now();

        Arc::new(Self {
            session_id,
            stable_identity,
            display_name: RwLock::new(display_name),
            connection_id: RwLock::new(connection_id),
            sender: RwLock::new(sender),
            handshake_token: RwLock::new(handshake_token),
            verified: AtomicBool::new(false),
            rooms: RwLock::new(HashSet::new()),
            state: RwLock::new(SessionState::Active),
            pending_expiry: Mutex::new(None),
            last_seen: RwLock::new(now),
            established_at: now,
        })
    }

    /// Get the session id
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the stable identity, if the client supplied one
    pub fn stable_identity(&self) -> Option<&str> {
        self.stable_identity.as_deref()
    }

    /// Get the current transport connection id
    pub async fn connection_id(&self) -> String {
        self.connection_id.read().await.clone()
    }

    /// Get the display name
    pub async fn display_name(&self) -> String {
        self.display_name.read().await.clone()
    }

    /// Get the current lifecycle state
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Set the lifecycle state
    pub async fn set_state(&self, state: SessionState) {
        *self.state.write().await = state;
    }

    /// Rebind the session to a fresh transport connection
    ///
    /// Used on resume: the preserved identity and room set stay, the
    /// transport-level attributes are replaced and the auth gate's
    /// verdict is reset for the new connection.
    pub async fn rebind(
        &self,
        connection_id: String,
        handshake_token: Option<String>,
        sender: mpsc::Sender<EventFrame>,
    ) {
        *self.connection_id.write().await = connection_id;
        *self.handshake_token.write().await = handshake_token;
        *self.sender.write().await = sender;
        self.verified.store(false, Ordering::SeqCst);
        self.set_state(SessionState::Active).await;
        self.touch().await;
    }

    /// Get the handshake token
    pub async fn handshake_token(&self) -> Option<String> {
        self.handshake_token.read().await.clone()
    }

    /// Whether the auth gate already verified this connection
    pub fn is_verified(&self) -> bool {
        self.verified.load(Ordering::SeqCst)
    }

    /// Record the auth gate's positive verdict for this connection
    pub fn set_verified(&self) {
        self.verified.store(true, Ordering::SeqCst);
    }

    /// Add a room to the joined set; returns false if already present
    pub async fn add_room(&self, room: &str) -> bool {
        self.rooms.write().await.insert(room.to_string())
    }

    /// Remove a room from the joined set; returns false if not joined
    pub async fn remove_room(&self, room: &str) -> bool {
        self.rooms.write().await.remove(room)
    }

    /// Whether the session is joined to a room
    pub async fn has_room(&self, room: &str) -> bool {
        self.rooms.read().await.contains(room)
    }

    /// Get all joined rooms
    pub async fn rooms(&self) -> Vec<String> {
        self.rooms.read().await.iter().cloned().collect()
    }

    /// Store the armed grace timer, replacing (and aborting) any old one
    pub fn set_pending_expiry(&self, handle: JoinHandle<()>) {
        let mut slot = self.pending_expiry.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    /// Cancel the pending grace timer; returns true if one was armed
    pub fn cancel_pending_expiry(&self) -> bool {
        let mut slot = self.pending_expiry.lock().unwrap_or_else(|e| e.into_inner());
        match slot.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Record inbound activity
    pub async fn touch(&self) {
        *self.last_seen.write().await = Utc::now();
    }

    /// Last inbound activity
    pub async fn last_seen(&self) -> DateTime<Utc> {
        *self.last_seen.read().await
    }

    /// Milliseconds since the last inbound activity
    pub async fn idle_ms(&self) -> i64 {
        (Utc::now() - self.last_seen().await).num_milliseconds()
    }

    /// When the session was first established
    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// Send an event to the session's current connection
    ///
    /// Returns false when the connection is gone; callers treat that
    /// like any other missed delivery on a volatile layer.
    pub async fn send(&self, frame: EventFrame) -> bool {
        let sender = self.sender.read().await.clone();
        sender.send(frame).await.is_ok()
    }

    /// Whether the current connection can still receive events
    pub async fn is_reachable(&self) -> bool {
        !self.sender.read().await.is_closed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("established_at", &self.established_at)
            .finish()
    }
}
