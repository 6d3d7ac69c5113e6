//! Command publishing
//!
//! The publish side of the fan-out adapter. The trait seam lets the
//! gateway swap the Redis publisher for a no-op one when the broker is
//! unreachable (single-node degraded mode) and lets tests capture
//! published commands.

use crate::{BroadcastCommand, FanoutResult, FANOUT_CHANNEL};
use async_trait::async_trait;
use redis::AsyncCommands;

/// Publishes broadcast commands to the shared broker channel
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Publish a command for every other node to apply
    async fn publish(&self, command: &BroadcastCommand) -> FanoutResult<()>;
}

/// Redis-backed publisher
///
/// Uses a `ConnectionManager`, which re-establishes the connection after
/// broker drops; publishes during an outage fail and are logged by the
/// caller, they never propagate to clients.
#[derive(Clone)]
pub struct RedisPublisher {
    conn: redis::aio::ConnectionManager,
}

impl RedisPublisher {
    /// Connect to the broker
    pub async fn connect(broker_url: &str) -> FanoutResult<Self> {
        let client = redis::Client::open(broker_url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;

        tracing::info!(broker_url = %broker_url, "Fan-out publisher connected");

        Ok(Self { conn })
    }
}

#[async_trait]
impl CommandPublisher for RedisPublisher {
    async fn publish(&self, command: &BroadcastCommand) -> FanoutResult<()> {
        let payload = command.to_json()?;
        let mut conn = self.conn.clone();

        let receivers: u32 = conn.publish(FANOUT_CHANNEL, &payload).await?;

        tracing::debug!(
            event_name = %command.event_name,
            receivers = receivers,
            "Published broadcast command"
        );

        Ok(())
    }
}

/// No-op publisher for single-node operation
///
/// Installed when the broker is unreachable at startup. Local broadcasts,
/// joins and the grace manager keep working; cross-node fan-out silently
/// stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

#[async_trait]
impl CommandPublisher for NullPublisher {
    async fn publish(&self, command: &BroadcastCommand) -> FanoutResult<()> {
        tracing::trace!(
            event_name = %command.event_name,
            "Single-node mode, command not replicated"
        );
        Ok(())
    }
}

impl std::fmt::Debug for RedisPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPublisher").finish_non_exhaustive()
    }
}
