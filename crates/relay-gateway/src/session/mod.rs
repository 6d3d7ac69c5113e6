//! Session lifecycle
//!
//! Tracks every connection's identity, room memberships and liveness,
//! and preserves sessions across short disconnects.

mod grace;
mod registry;
mod session;

pub use grace::GraceManager;
pub use registry::{ConnectOutcome, SessionRegistry};
pub use session::{Session, SessionState};
