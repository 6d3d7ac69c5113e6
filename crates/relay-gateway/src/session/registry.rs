//! Session registry
//!
//! The only component that mutates connection state. Uses `DashMap` for
//! concurrent access to the session, connection, room and identity
//! indices.

use super::{Session, SessionState};
use crate::protocol::{EventFrame, OnlineUserPayload, RoomKey, RoomMemberPayload};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Result of a connect attempt
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    pub session: Arc<Session>,
    /// True when an existing session in its grace window was resumed
    pub resumed: bool,
}

/// Tracks every live session on this node
pub struct SessionRegistry {
    /// Sessions by session id
    sessions: DashMap<String, Arc<Session>>,

    /// Connection id to session id mapping
    connections: DashMap<String, String>,

    /// Room key to session ids mapping (local membership only)
    rooms: DashMap<String, HashSet<String>>,

    /// Stable identity to session id mapping, for resume matching
    identities: DashMap<String, String>,
}

impl SessionRegistry {
    /// Create a new registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            connections: DashMap::new(),
            rooms: DashMap::new(),
            identities: DashMap::new(),
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a connection, resuming a grace-period session when the
    /// supplied stable identity matches one
    ///
    /// The resume path cancels the pending expiry timer and rebinds the
    /// preserved session to the new transport. Any other case (no
    /// identity, unknown identity, or a session that is not in its grace
    /// window) creates a brand-new session.
    pub async fn on_connect(
        &self,
        connection_id: String,
        display_name: String,
        stable_identity: Option<String>,
        handshake_token: Option<String>,
        sender: mpsc::Sender<EventFrame>,
    ) -> ConnectOutcome {
        if let Some(identity) = &stable_identity {
            if let Some(existing) = self.session_for_identity(identity) {
                // The reconnect wins only if the session is still present
                // and waiting; an expired session means brand-new.
                if existing.state().await == SessionState::Grace {
                    existing.cancel_pending_expiry();
                    existing
                        .rebind(connection_id.clone(), handshake_token, sender)
                        .await;
                    self.connections
                        .insert(connection_id, existing.session_id().to_string());

                    tracing::info!(
                        session_id = %existing.session_id(),
                        "Session resumed within grace window"
                    );

                    return ConnectOutcome {
                        session: existing,
                        resumed: true,
                    };
                }
            }
        }

        // A stable identity becomes the session id so the client can
        // resume later; colliding ids (duplicate login) fall back to the
        // connection id.
        let session_id = match &stable_identity {
            Some(identity) if !self.sessions.contains_key(identity) => identity.clone(),
            _ => connection_id.clone(),
        };

        let session = Session::new(
            session_id.clone(),
            connection_id.clone(),
            display_name,
            stable_identity.clone(),
            handshake_token,
            sender,
        );

        self.sessions.insert(session_id.clone(), session.clone());
        self.connections.insert(connection_id, session_id.clone());
        if let Some(identity) = stable_identity {
            // First binding wins; a duplicate login must not steal the
            // original session's resume rights.
            self.identities
                .entry(identity)
                .or_insert_with(|| session_id.clone());
        }

        tracing::debug!(session_id = %session_id, "Session created");

        ConnectOutcome {
            session,
            resumed: false,
        }
    }

    /// Mark a connection's session as disconnected
    ///
    /// The session is not deleted; it enters its grace window and is
    /// returned so the caller can arm the expiry timer.
    pub async fn on_disconnect(&self, connection_id: &str) -> Option<Arc<Session>> {
        let (_, session_id) = self.connections.remove(connection_id)?;
        let session = self.sessions.get(&session_id).map(|r| r.clone())?;

        // A stale disconnect for a connection the session already left
        // behind (resume raced the close) must not demote it.
        if session.connection_id().await != connection_id {
            return None;
        }

        session.set_state(SessionState::Grace).await;
        tracing::debug!(session_id = %session_id, "Session entered grace window");

        Some(session)
    }

    /// Delete a session and every index entry pointing at it
    pub async fn remove_session(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            if let Some(identity) = session.stable_identity() {
                self.identities
                    .remove_if(identity, |_, sid| sid.as_str() == session_id);
            }
            self.connections.retain(|_, sid| sid != session_id);

            for room in session.rooms().await {
                self.rooms.alter(&room, |_, mut members| {
                    members.remove(session_id);
                    members
                });
            }
            self.rooms.retain(|_, members| !members.is_empty());

            tracing::debug!(session_id = %session_id, "Session removed");
        }
    }

    /// Join a session to a room and return the room's local members
    ///
    /// The session's room set and the room index are updated together;
    /// they must never disagree.
    pub async fn join_room(&self, session: &Arc<Session>, room: &RoomKey) -> Vec<RoomMemberPayload> {
        session.add_room(room.as_str()).await;
        self.rooms
            .entry(room.as_str().to_string())
            .or_default()
            .insert(session.session_id().to_string());

        tracing::debug!(
            session_id = %session.session_id(),
            room = %room,
            "Joined room"
        );

        let mut members = Vec::new();
        for member in self.room_members(room.as_str()) {
            members.push(RoomMemberPayload {
                session_id: member.session_id().to_string(),
                display_name: member.display_name().await,
            });
        }
        members
    }

    /// Remove a session from a room; idempotent
    ///
    /// Returns false when the session was not a member.
    pub async fn leave_room(&self, session: &Arc<Session>, room: &str) -> bool {
        let was_member = session.remove_room(room).await;

        self.rooms.alter(room, |_, mut members| {
            members.remove(session.session_id());
            members
        });
        self.rooms.retain(|_, members| !members.is_empty());

        if was_member {
            tracing::debug!(
                session_id = %session.session_id(),
                room = %room,
                "Left room"
            );
        }

        was_member
    }

    /// Get all local sessions joined to a room
    pub fn room_members(&self, room: &str) -> Vec<Arc<Session>> {
        self.rooms
            .get(room)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|sid| self.sessions.get(sid).map(|r| r.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deliver a frame to every local member of a room
    ///
    /// `exclude` skips one session id (exclusive mode).
    pub async fn send_to_room(&self, room: &str, frame: &EventFrame, exclude: Option<&str>) -> usize {
        let mut sent = 0;

        for member in self.room_members(room) {
            if exclude == Some(member.session_id()) {
                continue;
            }
            if member.send(frame.clone()).await {
                sent += 1;
            }
        }

        tracing::trace!(room = %room, sent = sent, "Delivered to room");
        sent
    }

    /// Deliver a frame to a single connection on this node
    ///
    /// The target may be a connection id or a session id; returns false
    /// when it is not connected here.
    pub async fn send_to_connection(&self, target: &str, frame: EventFrame) -> bool {
        let session = self
            .connections
            .get(target)
            .and_then(|sid| self.sessions.get(sid.value()).map(|r| r.clone()))
            .or_else(|| self.sessions.get(target).map(|r| r.clone()));

        match session {
            Some(session) if session.state().await == SessionState::Active => {
                session.send(frame).await
            }
            _ => false,
        }
    }

    /// Deliver a frame to every local session
    pub async fn broadcast_all(&self, frame: &EventFrame, exclude: Option<&str>) -> usize {
        let sessions: Vec<Arc<Session>> = self.sessions.iter().map(|r| r.clone()).collect();
        let mut sent = 0;

        for session in sessions {
            if exclude == Some(session.session_id()) {
                continue;
            }
            if session.send(frame.clone()).await {
                sent += 1;
            }
        }

        sent
    }

    /// Local-node snapshot of online users
    ///
    /// This is deliberately not a cluster-wide view; each node answers
    /// presence queries from its own registry only.
    pub async fn list_online(&self) -> Vec<OnlineUserPayload> {
        let sessions: Vec<Arc<Session>> = self.sessions.iter().map(|r| r.clone()).collect();
        let mut users = Vec::new();

        for session in sessions {
            if session.state().await != SessionState::Active {
                continue;
            }
            users.push(OnlineUserPayload {
                session_id: session.session_id().to_string(),
                display_name: session.display_name().await,
                rooms: session.rooms().await,
            });
        }

        users
    }

    /// Number of sessions currently active (grace-period sessions are
    /// preserved but not counted)
    pub async fn active_count(&self) -> usize {
        let sessions: Vec<Arc<Session>> = self.sessions.iter().map(|r| r.clone()).collect();
        let mut count = 0;

        for session in sessions {
            if session.state().await == SessionState::Active {
                count += 1;
            }
        }

        count
    }

    /// Get a session by id
    pub fn session_by_id(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|r| r.clone())
    }

    /// Check whether a session exists
    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Total number of sessions including those in grace
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of rooms with at least one local member
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn session_for_identity(&self, identity: &str) -> Option<Arc<Session>> {
        let session_id = self.identities.get(identity)?.clone();
        self.sessions.get(&session_id).map(|r| r.clone())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
