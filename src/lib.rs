//! # troupe-scribe
//!
//! Logs a DragonRealms character in and keeps a plain-text transcript of
//! whatever happens until asked to stop.
//!
//! The crate is split along the three moving parts of a recording:
//!
//! - **auth**: the EAccess challenge-response login that yields a one-shot
//!   session key
//! - **recording**: a reserved tmux server running the client, with a
//!   keep-alive loop and graceful sign-off
//! - **lifecycle**: start/stop/kill coordination, login retries and
//!   transcript hand-off through notifications
//!
//! A small HTTP control API in [`api`] drives the lifecycle from outside.
//!
//! ## Quick Start
//!
//! ```no_run
//! use troupe_scribe::auth::{Credentials, EAccessClient};
//! use troupe_scribe::lifecycle::{LifecycleManager, LifecycleSettings, LogNotifier};
//! use troupe_scribe::recording::{RecordingSettings, SessionController, Tmux};
//!
//! #[tokio::main]
//! async fn main() {
//!     troupe_scribe::logging::try_init().ok();
//!
//!     let manager = LifecycleManager::new(
//!         Credentials::new("account", "secret", "Ragge"),
//!         EAccessClient::default(),
//!         SessionController::new(Tmux::default(), RecordingSettings::default()),
//!         LifecycleSettings::default(),
//!     );
//!
//!     let outcome = manager.start(&LogNotifier).await;
//!     println!("{:?}", outcome);
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod recording;

// Re-export commonly used types
pub use auth::{AuthError, Authenticator, Credentials, EAccessClient, SessionKey};
pub use error::{Result, ScribeError};
pub use lifecycle::{LifecycleManager, LifecycleSettings, LifecycleState, Notification, Notifier};
pub use recording::{KillOutcome, Multiplexer, Recorder, RecordingSettings, SessionController, Tmux};
