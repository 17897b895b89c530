//! Control API for troupe-scribe.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information
//! - `GET /api/v1/recording` - Current lifecycle state
//! - `POST /api/v1/recording/start` - Start recording (runs in the background)
//! - `POST /api/v1/recording/stop` - Ask the recording to sign off
//! - `POST /api/v1/recording/kill` - Tear the session down
//! - `GET /api/v1/notifications?after=N` - Recent status notifications
//!
//! Every route except `/health` requires `Authorization: Bearer <key>` when
//! API keys are configured.

pub mod auth;
pub mod handlers;
pub mod router;
pub mod types;

pub use auth::{require_api_key, ApiKeyStore};
pub use handlers::AppState;
pub use router::{create_router_with_state, serve, ServerConfig};
pub use types::{
    AcceptedResponse, ErrorResponse, KillResponse, NotificationsResponse,
    RecordingStatusResponse,
};
