//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::lifecycle::{FeedEntry, LifecycleState};
use crate::recording::KillOutcome;

/// Current recording status.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingStatusResponse {
    pub state: LifecycleState,
    /// True while a recording is running or winding down.
    pub active: bool,
}

impl RecordingStatusResponse {
    pub fn new(state: LifecycleState) -> Self {
        Self {
            state,
            active: state.is_active(),
        }
    }
}

/// Response to a start or stop request.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    /// Whether the request led to any action.
    pub accepted: bool,
    /// State observed when the request was handled.
    pub state: LifecycleState,
}

/// Response to a kill request.
#[derive(Debug, Clone, Serialize)]
pub struct KillResponse {
    /// `terminated`, `already_absent` or `failed`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<KillOutcome> for KillResponse {
    fn from(outcome: KillOutcome) -> Self {
        match outcome {
            KillOutcome::Terminated => Self {
                outcome: "terminated",
                detail: None,
            },
            KillOutcome::AlreadyAbsent => Self {
                outcome: "already_absent",
                detail: None,
            },
            KillOutcome::Failed(detail) => Self {
                outcome: "failed",
                detail: Some(detail),
            },
        }
    }
}

/// Query for the notification feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsQuery {
    /// Only return entries after this sequence number.
    #[serde(default)]
    pub after: Option<u64>,
}

/// Notification feed page.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub count: usize,
    pub notifications: Vec<FeedEntry>,
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "INVALID_STATE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_recording(state: LifecycleState) -> Self {
        Self::new(
            "NOT_RECORDING",
            format!("No recording to stop (state: {})", state),
        )
    }

    pub fn kill_failed(detail: impl Into<String>) -> Self {
        Self::new("KILL_FAILED", detail)
    }
}
