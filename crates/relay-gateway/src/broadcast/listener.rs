//! Fan-out listener
//!
//! Receives broadcast commands from the broker subscription and applies
//! them to the local node.

use crate::broadcast::Broadcaster;
use relay_fanout::{BroadcastCommand, CommandSubscriber, FanoutResult, SubscriberConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Routes incoming broker commands to the local broadcaster
pub struct FanoutListener {
    broadcaster: Arc<Broadcaster>,
    subscriber: CommandSubscriber,
    running: Arc<AtomicBool>,
}

impl FanoutListener {
    /// Connect to the broker
    ///
    /// Failure here is the caller's cue to run single-node: local
    /// broadcasts, joins and the grace manager are unaffected.
    pub async fn connect(
        config: SubscriberConfig,
        broadcaster: Arc<Broadcaster>,
    ) -> FanoutResult<Self> {
        let subscriber = CommandSubscriber::connect(config).await?;

        Ok(Self {
            broadcaster,
            subscriber,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start the background apply loop
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Fan-out listener is already running");
            return;
        }

        let listener = self.clone();
        tokio::spawn(async move {
            listener.run().await;
        });

        tracing::info!(node_id = %self.broadcaster.node_id(), "Fan-out listener started");
    }

    async fn run(&self) {
        let receiver = self.subscriber.receiver();
        Self::pump(&self.broadcaster, receiver, &self.running).await;
        tracing::info!("Fan-out listener loop ended");
    }

    /// Apply incoming commands until the channel closes or the running
    /// flag is cleared
    ///
    /// A lagged receiver drops the missed commands and keeps going;
    /// broadcasts carry no delivery guarantee across nodes.
    async fn pump(
        broadcaster: &Broadcaster,
        mut receiver: broadcast::Receiver<BroadcastCommand>,
        running: &AtomicBool,
    ) {
        while running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(command) => {
                    broadcaster.apply(command).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Fan-out listener lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Fan-out listener channel closed");
                    break;
                }
            }
        }

        running.store(false, Ordering::SeqCst);
    }

    /// Stop the listener and shut down the broker subscription
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.subscriber.shutdown().await.ok();
        tracing::info!("Fan-out listener stopped");
    }

    /// Whether the apply loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for FanoutListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutListener")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
