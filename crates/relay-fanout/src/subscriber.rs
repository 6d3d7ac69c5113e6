//! Broker subscription
//!
//! Listens on the shared fan-out channel and hands decoded commands to
//! the gateway. Connection loss is retried with a fixed delay; while the
//! broker is down the node simply operates single-node.

use crate::{BroadcastCommand, FanoutError, FanoutResult, FANOUT_CHANNEL};
use futures_util::StreamExt;
use redis::Client;
use tokio::sync::{broadcast, mpsc};

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Broker connection URL
    pub broker_url: String,
    /// Buffer size for the command broadcast channel
    pub buffer: usize,
    /// Delay before reconnecting after a broker failure
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            broker_url: "redis://127.0.0.1:6379".to_string(),
            buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Control commands for the background listener
#[derive(Debug)]
enum ListenerCommand {
    Shutdown,
}

/// Receives broadcast commands from the shared broker channel
pub struct CommandSubscriber {
    broadcast_tx: broadcast::Sender<BroadcastCommand>,
    control_tx: mpsc::Sender<ListenerCommand>,
}

impl CommandSubscriber {
    /// Create a subscriber and start the background listener
    ///
    /// The initial connection is attempted eagerly so callers can decide
    /// to degrade to single-node mode when the broker is down.
    pub async fn connect(config: SubscriberConfig) -> FanoutResult<Self> {
        // Probe the broker before spawning; a dead broker at startup is
        // reported to the caller instead of silently retrying forever.
        let client = Client::open(config.broker_url.as_str())?;
        let probe = client.get_async_pubsub().await?;
        drop(probe);

        let (broadcast_tx, _) = broadcast::channel(config.buffer);
        let (control_tx, control_rx) = mpsc::channel(8);

        tokio::spawn(Self::listener_loop(
            config,
            broadcast_tx.clone(),
            control_rx,
        ));

        Ok(Self {
            broadcast_tx,
            control_tx,
        })
    }

    /// Background loop: reconnect with a fixed delay on broker failure
    async fn listener_loop(
        config: SubscriberConfig,
        broadcast_tx: broadcast::Sender<BroadcastCommand>,
        mut control_rx: mpsc::Receiver<ListenerCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &broadcast_tx, &mut control_rx).await {
                Ok(()) => {
                    tracing::info!("Fan-out subscriber shutting down");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Fan-out broker unreachable, node running single-node until it returns"
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// Listen until a broker error or a shutdown command
    async fn run_listener(
        config: &SubscriberConfig,
        broadcast_tx: &broadcast::Sender<BroadcastCommand>,
        control_rx: &mut mpsc::Receiver<ListenerCommand>,
    ) -> FanoutResult<()> {
        let client = Client::open(config.broker_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(FANOUT_CHANNEL).await?;

        tracing::info!(channel = FANOUT_CHANNEL, "Fan-out subscriber connected");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    match msg {
                        Some(msg) => {
                            let payload: String = msg.get_payload().unwrap_or_default();
                            match BroadcastCommand::from_json(&payload) {
                                Ok(command) => {
                                    // Send errors mean no receivers; fine
                                    let _ = broadcast_tx.send(command);
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        error = %e,
                                        "Discarding malformed broadcast command"
                                    );
                                }
                            }
                        }
                        None => {
                            return Err(FanoutError::ChannelClosed);
                        }
                    }
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(ListenerCommand::Shutdown) | None => return Ok(()),
                    }
                }
            }
        }
    }

    /// Get a receiver for incoming commands
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<BroadcastCommand> {
        self.broadcast_tx.subscribe()
    }

    /// Shut down the background listener
    pub async fn shutdown(&self) -> FanoutResult<()> {
        self.control_tx
            .send(ListenerCommand::Shutdown)
            .await
            .map_err(|_| FanoutError::ChannelClosed)
    }
}

impl std::fmt::Debug for CommandSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSubscriber").finish_non_exhaustive()
    }
}
