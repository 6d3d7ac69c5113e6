//! Auth gate for protected operations
//!
//! Verifies the handshake token against the shared secret the first time
//! a protected operation runs on a connection; the verdict is cached on
//! the session until the transport is rebound.

use crate::session::Session;
use relay_common::{GatewayError, GatewayResult};
use std::future::Future;
use std::sync::Arc;

/// Shared-secret auth gate
pub struct AuthGate {
    secret: String,
}

impl AuthGate {
    /// Create a new auth gate
    pub fn new(secret: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            secret: secret.into(),
        })
    }

    /// Authorize a session for a protected operation
    ///
    /// A rejection refuses only this message; the connection stays open
    /// and unprotected operations keep working.
    pub async fn authorize(&self, session: &Arc<Session>) -> GatewayResult<()> {
        if session.is_verified() {
            return Ok(());
        }

        let token = session
            .handshake_token()
            .await
            .ok_or_else(|| GatewayError::authentication("no token supplied at handshake"))?;

        if token != self.secret {
            return Err(GatewayError::authentication("invalid token"));
        }

        session.set_verified();
        tracing::debug!(session_id = %session.session_id(), "Session verified");
        Ok(())
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

/// Run a handler only if the session passes the auth gate
pub async fn with_auth<F, Fut, T>(
    gate: &AuthGate,
    session: &Arc<Session>,
    handler: F,
) -> GatewayResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    gate.authorize(session).await?;
    handler().await
}
