//! API router configuration.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::auth::{require_api_key, ApiKeyStore};
use super::handlers::{
    api_info, get_recording, health, kill_recording, list_notifications, start_recording,
    stop_recording, AppState,
};
use crate::error::ScribeError;

/// Create the API router with custom state.
pub fn create_router_with_state(state: AppState) -> Router {
    let recording_routes = Router::new()
        .route("/", get(get_recording))
        .route("/start", post(start_recording))
        .route("/stop", post(stop_recording))
        .route("/kill", post(kill_recording));

    let api_v1 = Router::new()
        .route("/", get(api_info))
        .route("/notifications", get(list_notifications))
        .nest("/recording", recording_routes);

    let keys = Arc::clone(&state.keys);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(middleware::from_fn_with_state(keys, require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Accepted bearer keys; empty disables the check.
    pub api_keys: Vec<String>,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            api_keys: Vec::new(),
        }
    }

    pub fn with_api_keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.api_keys.extend(keys);
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Key store matching this configuration.
    pub fn key_store(&self) -> ApiKeyStore {
        if self.api_keys.is_empty() {
            ApiKeyStore::disabled()
        } else {
            ApiKeyStore::with_keys(self.api_keys.iter().cloned())
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

/// Start the API server and run until ctrl-c.
pub async fn serve(config: ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router_with_state(state);

    tracing::info!("Starting troupe-scribe control API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(ScribeError::Io)?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ScribeError::Io(std::io::Error::other(e.to_string())))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
