//! tmux driver for the reserved recording server.

use std::io::ErrorKind;
use std::process::{Command, Output};

use tracing::{debug, info};

use crate::error::ScribeError;
use crate::Result;

/// Default socket name reserved for the recording server.
pub const DEFAULT_SOCKET: &str = "dr-tmux-server";

/// Default session name inside the reserved server.
pub const DEFAULT_SESSION: &str = "dr-window";

/// Result of tearing down the reserved server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    /// A live server was terminated.
    Terminated,
    /// There was nothing to terminate.
    AlreadyAbsent,
    /// The server could not be terminated.
    Failed(String),
}

impl KillOutcome {
    /// True when no server is left running.
    pub fn is_clean(&self) -> bool {
        !matches!(self, KillOutcome::Failed(_))
    }
}

/// Operations needed from a terminal multiplexer.
///
/// Every method blocks on an external process.
pub trait Multiplexer: Send + Sync + 'static {
    /// Create a detached session running the default shell.
    fn new_session(&self, session: &str) -> Result<()>;

    /// Type `keys` literally into the session's active pane.
    fn send_keys(&self, session: &str, keys: &str, enter: bool) -> Result<()>;

    /// Whether a server is listening on the reserved socket.
    fn server_alive(&self) -> Result<bool>;

    /// Kill the whole server, not just a pane.
    ///
    /// A missing server is reported as [`KillOutcome::AlreadyAbsent`].
    fn kill_server(&self) -> Result<KillOutcome>;
}

/// [`Multiplexer`] backed by the `tmux` binary on a private socket.
#[derive(Debug, Clone)]
pub struct Tmux {
    binary: String,
    socket: String,
}

impl Tmux {
    pub fn new(socket: impl Into<String>) -> Self {
        Self {
            binary: "tmux".to_string(),
            socket: socket.into(),
        }
    }

    /// Use a tmux binary other than the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn socket(&self) -> &str {
        &self.socket
    }

    fn run(&self, args: &[&str]) -> std::io::Result<Output> {
        debug!(socket = %self.socket, ?args, "tmux");
        Command::new(&self.binary)
            .arg("-L")
            .arg(&self.socket)
            .args(args)
            .output()
    }

    fn run_checked(&self, args: &[&str]) -> Result<()> {
        let output = self
            .run(args)
            .map_err(|e| ScribeError::Multiplexer(format!("failed to run tmux: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ScribeError::Multiplexer(format!(
                "tmux {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

impl Default for Tmux {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET)
    }
}

/// stderr fragments tmux prints when nothing listens on the socket.
fn is_missing_server(stderr: &str) -> bool {
    stderr.contains("no server running")
        || stderr.contains("error connecting to")
        || stderr.contains("No such file or directory")
}

impl Multiplexer for Tmux {
    fn new_session(&self, session: &str) -> Result<()> {
        info!(socket = %self.socket, session, "Creating tmux session");
        self.run_checked(&["new-session", "-d", "-s", session])
    }

    fn send_keys(&self, session: &str, keys: &str, enter: bool) -> Result<()> {
        self.run_checked(&["send-keys", "-t", session, "-l", keys])?;
        if enter {
            self.run_checked(&["send-keys", "-t", session, "Enter"])?;
        }
        Ok(())
    }

    fn server_alive(&self) -> Result<bool> {
        match self.run(&["list-sessions"]) {
            Ok(output) => Ok(output.status.success()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ScribeError::Multiplexer(format!("failed to run tmux: {e}"))),
        }
    }

    fn kill_server(&self) -> Result<KillOutcome> {
        let output = match self.run(&["kill-server"]) {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(KillOutcome::AlreadyAbsent),
            Err(e) => return Err(ScribeError::Multiplexer(format!("failed to run tmux: {e}"))),
        };

        if output.status.success() {
            info!(socket = %self.socket, "Killed tmux server");
            return Ok(KillOutcome::Terminated);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_server(&stderr) {
            Ok(KillOutcome::AlreadyAbsent)
        } else {
            Err(ScribeError::Multiplexer(format!(
                "tmux kill-server failed: {}",
                stderr.trim()
            )))
        }
    }
}
