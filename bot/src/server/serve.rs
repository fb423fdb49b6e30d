//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::BotError;
use crate::server::handlers::{health_handler, version_handler, webhook_handler};
use crate::server::state::ServerState;

/// Build the router with all routes and middleware
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // GitHub deliveries
        .route("/webhook", post(webhook_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), BotError>>, BotError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting webhook server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BotError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| BotError::ServerError(e.to_string()))
    });

    Ok(handle)
}
