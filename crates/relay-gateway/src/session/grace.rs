//! Reconnection grace manager
//!
//! Defers cleanup after an abrupt disconnect so a quick reconnect can
//! resume the session invisibly. Only when the window elapses without a
//! reconnect do peers learn the session is gone.

use crate::broadcast::Broadcaster;
use crate::protocol::{EventFrame, EventType, UserDisconnectedPayload, UserLeftRoomPayload};
use crate::session::{Session, SessionRegistry, SessionState};
use std::sync::Arc;
use std::time::Duration;

/// Arms and resolves per-session grace timers
pub struct GraceManager {
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<Broadcaster>,
    grace: Duration,
}

impl GraceManager {
    /// Create a new grace manager
    pub fn new(
        registry: Arc<SessionRegistry>,
        broadcaster: Arc<Broadcaster>,
        grace: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            broadcaster,
            grace,
        })
    }

    /// Get the configured grace window
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Arm the expiry timer for a session that just entered its grace
    /// window
    ///
    /// The timer handle is stored on the session; a resume cancels it
    /// there, in which case no departure event is ever emitted.
    pub fn arm(self: &Arc<Self>, session: &Arc<Session>) {
        let manager = self.clone();
        let session_id = session.session_id().to_string();
        let grace = self.grace;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            manager.expire(&session_id).await;
        });

        session.set_pending_expiry(handle);

        tracing::debug!(
            session_id = %session.session_id(),
            grace_ms = self.grace.as_millis() as u64,
            "Grace timer armed"
        );
    }

    /// Expire a session whose grace window elapsed
    ///
    /// A reconnect that landed before this runs has already flipped the
    /// session back to `Active`, which makes this a no-op.
    async fn expire(&self, session_id: &str) {
        let Some(session) = self.registry.session_by_id(session_id) else {
            return;
        };
        if session.state().await != SessionState::Grace {
            return;
        }

        session.set_state(SessionState::Expired).await;
        let username = session.display_name().await;

        tracing::info!(session_id = %session_id, "Grace window elapsed, session expired");

        // The departing session is unreachable, so the inclusive mode
        // only reaches the remaining members.
        for room in session.rooms().await {
            let payload = UserLeftRoomPayload {
                username: username.clone(),
                room: room.clone(),
            };
            self.broadcaster
                .broadcast_inclusive(
                    &room,
                    EventType::UserLeftRoom.as_str(),
                    serde_json::to_value(&payload).unwrap_or_default(),
                )
                .await;
        }

        let payload = UserDisconnectedPayload {
            username,
            total_users: self.registry.active_count().await,
        };
        self.registry
            .broadcast_all(
                &EventFrame::from_payload(EventType::UserDisconnected.as_str(), &payload),
                None,
            )
            .await;

        self.registry.remove_session(session_id).await;
    }
}

impl std::fmt::Debug for GraceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraceManager")
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}
