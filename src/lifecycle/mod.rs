//! Recording lifecycle.
//!
//! This module provides the caller-facing side of troupe-scribe:
//! - the Idle → Authenticating → Recording → Stopping state machine
//! - single-flight `start`, cooperative `stop` and forced `kill`
//! - status notifications and transcript hand-off
//!
//! # Example
//!
//! ```no_run
//! use troupe_scribe::auth::{Credentials, EAccessClient};
//! use troupe_scribe::lifecycle::{LifecycleManager, LifecycleSettings, LogNotifier};
//! use troupe_scribe::recording::{RecordingSettings, SessionController, Tmux};
//!
//! # async fn run() {
//! let manager = LifecycleManager::new(
//!     Credentials::new("account", "secret", "Ragge"),
//!     EAccessClient::default(),
//!     SessionController::new(Tmux::default(), RecordingSettings::default()),
//!     LifecycleSettings::default(),
//! );
//! manager.start(&LogNotifier).await;
//! # }
//! ```

mod manager;
mod notify;
mod state;

pub use manager::{LifecycleManager, LifecycleSettings, StartOutcome};
pub use notify::{
    ChannelNotifier, FeedEntry, FeedNotifier, LogNotifier, Notification, NotificationKind,
    Notifier,
};
pub use state::LifecycleState;
