//! Room broadcast primitives and cluster fan-out
//!
//! Local delivery happens first, then the same command is replicated to
//! every other node through the fan-out adapter.

mod broadcaster;
mod listener;

pub use broadcaster::Broadcaster;
pub use listener::FanoutListener;
