//! Recording session control.
//!
//! This module owns the external side of a recording:
//! - the reserved tmux server the client runs in
//! - the one-shot launch script carrying the session key
//! - transcript naming
//! - the keep-alive loop and its stop signal

mod controller;
mod mux;
mod script;
mod stop;
mod transcript;

pub use controller::{Recorder, RecordingSettings, SessionController};
pub use mux::{KillOutcome, Multiplexer, Tmux, DEFAULT_SESSION, DEFAULT_SOCKET};
pub use script::{
    LaunchScript, DEFAULT_GAME_HOST, DEFAULT_GAME_PORT, DEFAULT_INCLUDES, DEFAULT_SCRIPT_PATH,
    DEFAULT_SESSION_NAME,
};
pub use stop::{stop_channel, StopHandle, StopReason, StopToken};
pub use transcript::{
    is_transcript_name, transcript_path, transcript_path_at, DEFAULT_TRANSCRIPT_DIR,
    TIMESTAMP_FORMAT,
};
