//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use super::auth::ApiKeyStore;
use super::types::{
    AcceptedResponse, ErrorResponse, KillResponse, NotificationsQuery, NotificationsResponse,
    RecordingStatusResponse,
};
use crate::lifecycle::{FeedNotifier, LifecycleManager};
use crate::recording::KillOutcome;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<LifecycleManager>,
    pub feed: Arc<FeedNotifier>,
    pub keys: Arc<ApiKeyStore>,
}

impl AppState {
    /// State with authentication disabled.
    pub fn new(manager: LifecycleManager) -> Self {
        Self {
            manager: Arc::new(manager),
            feed: Arc::new(FeedNotifier::default()),
            keys: Arc::new(ApiKeyStore::disabled()),
        }
    }

    pub fn with_keys(mut self, keys: ApiKeyStore) -> Self {
        self.keys = Arc::new(keys);
        self
    }
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "troupe-scribe",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "state": state.manager.state(),
    }))
}

/// Current recording state.
pub async fn get_recording(State(state): State<AppState>) -> Json<RecordingStatusResponse> {
    Json(RecordingStatusResponse::new(state.manager.state()))
}

/// Start a recording in the background.
///
/// Progress and the transcript are reported through the notification feed.
pub async fn start_recording(
    State(state): State<AppState>,
) -> (StatusCode, Json<AcceptedResponse>) {
    let observed = state.manager.state();
    let manager = Arc::clone(&state.manager);
    let feed = Arc::clone(&state.feed);

    tokio::spawn(async move {
        let outcome = manager.start(feed.as_ref()).await;
        tracing::debug!(?outcome, "Background start finished");
    });

    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            accepted: true,
            state: observed,
        }),
    )
}

/// Ask the running recording to sign off.
pub async fn stop_recording(
    State(state): State<AppState>,
) -> (StatusCode, Json<AcceptedResponse>) {
    let accepted = state.manager.stop(state.feed.as_ref()).await;
    if !accepted {
        tracing::debug!(state = %state.manager.state(), "Stop ignored");
    }

    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            accepted,
            state: state.manager.state(),
        }),
    )
}

/// Tear down the reserved session unconditionally.
pub async fn kill_recording(
    State(state): State<AppState>,
) -> Result<Json<KillResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.manager.kill().await {
        KillOutcome::Failed(detail) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::kill_failed(detail)),
        )),
        outcome => Ok(Json(KillResponse::from(outcome))),
    }
}

/// Recent notifications, oldest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Json<NotificationsResponse> {
    let notifications = state.feed.since(query.after);
    Json(NotificationsResponse {
        count: notifications.len(),
        notifications,
    })
}
