//! Shared application state

use crate::auth::AuthGate;
use crate::broadcast::Broadcaster;
use crate::session::{GraceManager, SessionRegistry};
use relay_common::GatewayConfig;
use std::sync::Arc;

/// State shared by every connection and handler
#[derive(Clone)]
pub struct GatewayState {
    config: Arc<GatewayConfig>,
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<Broadcaster>,
    grace: Arc<GraceManager>,
    auth: Arc<AuthGate>,
}

impl GatewayState {
    /// Assemble the shared state
    pub fn new(
        config: Arc<GatewayConfig>,
        registry: Arc<SessionRegistry>,
        broadcaster: Arc<Broadcaster>,
        grace: Arc<GraceManager>,
        auth: Arc<AuthGate>,
    ) -> Self {
        Self {
            config,
            registry,
            broadcaster,
            grace,
            auth,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn grace(&self) -> &Arc<GraceManager> {
        &self.grace
    }

    pub fn auth(&self) -> &Arc<AuthGate> {
        &self.auth
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("sessions", &self.registry.session_count())
            .finish_non_exhaustive()
    }
}
