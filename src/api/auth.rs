//! Bearer API key check for the control API.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

const BEARER_PREFIX: &str = "Bearer ";

/// API keys accepted by the control API, fixed at startup.
///
/// A disabled store lets every request through.
#[derive(Debug, Default)]
pub struct ApiKeyStore {
    keys: HashSet<String>,
    enabled: bool,
}

impl ApiKeyStore {
    /// Create an enforcing store holding `keys`.
    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            enabled: true,
        }
    }

    /// Create a store with authentication disabled.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Extract the key from an `Authorization` header value.
    pub fn extract_key(header_value: &str) -> Option<&str> {
        header_value.strip_prefix(BEARER_PREFIX)
    }
}

/// Authentication middleware for axum.
pub async fn require_api_key(
    State(store): State<Arc<ApiKeyStore>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !store.is_enabled() || request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let key = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(ApiKeyStore::extract_key);

    match key {
        Some(key) if store.is_valid(key) => Ok(next.run(request).await),
        _ => {
            tracing::debug!(path = %request.uri().path(), "Rejected request without valid API key");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
