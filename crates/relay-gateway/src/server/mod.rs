//! Gateway server setup
//!
//! Wires the registry, broadcaster, fan-out listener and auth gate
//! together and serves the WebSocket endpoint.

mod handler;
mod state;

pub use handler::{close_connection, establish_session, gateway_handler, ConnectParams};
pub use state::GatewayState;

use crate::auth::AuthGate;
use crate::broadcast::{Broadcaster, FanoutListener};
use crate::session::{GraceManager, SessionRegistry};
use axum::http::HeaderValue;
use axum::{routing::get, Router};
use relay_common::{GatewayConfig, GatewayError};
use relay_fanout::{NodeId, NullPublisher, RedisPublisher, SubscriberConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let cors = build_cors(&state.config().cors.allowed_origins);

    create_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new().allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(origins)
}

/// Initialize all components and create `GatewayState`
///
/// The broker is optional at startup: when it cannot be reached the
/// node comes up single-node, with every local operation intact, and
/// logs the degradation. The fan-out listener handle is returned so the
/// caller can stop the subscription on shutdown.
pub async fn create_gateway_state(
    config: GatewayConfig,
) -> (GatewayState, Option<Arc<FanoutListener>>) {
    let node = NodeId::generate();
    let registry = SessionRegistry::new_shared();

    tracing::info!(node_id = %node, "Connecting to fan-out broker...");

    let publisher: Arc<dyn relay_fanout::CommandPublisher> =
        match RedisPublisher::connect(&config.broker.url).await {
            Ok(publisher) => Arc::new(publisher),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Fan-out broker unreachable, publishing disabled"
                );
                Arc::new(NullPublisher)
            }
        };

    let broadcaster = Broadcaster::new(node, registry.clone(), publisher);

    let subscriber_config = SubscriberConfig {
        broker_url: config.broker.url.clone(),
        ..SubscriberConfig::default()
    };
    let fanout = match FanoutListener::connect(subscriber_config, broadcaster.clone()).await {
        Ok(listener) => {
            let listener = Arc::new(listener);
            listener.clone().start();
            Some(listener)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Fan-out subscription unavailable, running single-node"
            );
            None
        }
    };

    let grace = GraceManager::new(
        registry.clone(),
        broadcaster.clone(),
        Duration::from_millis(config.session.reconnect_grace_ms),
    );
    let auth = AuthGate::new(config.auth.shared_secret.clone());

    let state = GatewayState::new(Arc::new(config), registry, broadcaster, grace, auth);
    (state, fanout)
}

/// Run the gateway server until a shutdown signal arrives
pub async fn run_server(app: Router, address: &str) -> Result<(), GatewayError> {
    tracing::info!("Starting gateway server on {address}");

    let listener = TcpListener::bind(address)
        .await
        .map_err(GatewayError::internal)?;

    tracing::info!("Gateway listening on ws://{address}/gateway");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(GatewayError::internal)?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install shutdown handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Run the complete gateway server with configuration
pub async fn run(config: GatewayConfig) -> Result<(), GatewayError> {
    let address = config.server.address();

    let (state, fanout) = create_gateway_state(config).await;
    let app = create_app(state);

    run_server(app, &address).await?;

    if let Some(listener) = fanout {
        listener.stop().await;
    }

    Ok(())
}
