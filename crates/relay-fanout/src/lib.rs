//! # relay-fanout
//!
//! Replicates broadcast commands between gateway nodes over a shared
//! pub/sub broker so that a room spanning several nodes behaves as one
//! logical room.
//!
//! Every node tags outgoing commands with its own [`NodeId`]; a node that
//! receives a command carrying its own id discards it, which is the only
//! loop-prevention mechanism needed (local delivery already happened
//! before publishing).

mod command;
mod node;
mod publisher;
mod subscriber;

pub use command::{BroadcastCommand, BroadcastTarget};
pub use node::NodeId;
pub use publisher::{CommandPublisher, NullPublisher, RedisPublisher};
pub use subscriber::{CommandSubscriber, SubscriberConfig};

/// The single broker channel shared by every node in the cluster
pub const FANOUT_CHANNEL: &str = "relay:fanout";

/// Error type for fan-out operations
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("Broker error: {0}")]
    Broker(#[from] redis::RedisError),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Subscriber channel closed")]
    ChannelClosed,
}

/// Result type for fan-out operations
pub type FanoutResult<T> = Result<T, FanoutError>;
