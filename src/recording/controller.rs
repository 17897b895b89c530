//! Drives the tintin++ client inside the reserved tmux session.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::mux::{KillOutcome, Multiplexer, DEFAULT_SESSION};
use super::script::{
    LaunchScript, DEFAULT_GAME_HOST, DEFAULT_GAME_PORT, DEFAULT_INCLUDES, DEFAULT_SCRIPT_PATH,
    DEFAULT_SESSION_NAME,
};
use super::stop::{StopReason, StopToken};
use super::transcript::{transcript_path, DEFAULT_TRANSCRIPT_DIR};
use crate::auth::SessionKey;
use crate::error::ScribeError;
use crate::Result;

/// Something that can record one game session at a time.
///
/// All methods block and are run on the blocking pool.
pub trait Recorder: Send + Sync + 'static {
    /// Record until `stop` fires, returning the transcript path.
    fn record(&self, key: SessionKey, stop: StopToken) -> Result<PathBuf>;

    /// Whether a recording session from any run is alive.
    fn session_alive(&self) -> Result<bool>;

    /// Forcefully tear down the recording session.
    fn kill(&self) -> Result<KillOutcome>;
}

/// Timings, scripted actions and file locations for a recording run.
#[derive(Debug, Clone)]
pub struct RecordingSettings {
    /// Prefix of transcript file names.
    pub log_prefix: String,
    /// Directory transcripts are written to.
    pub transcript_dir: PathBuf,
    /// Where the launch script is written.
    pub script_path: PathBuf,
    /// Client command; the script path is appended.
    pub client_command: String,
    /// Name of the tmux session inside the reserved server.
    pub tmux_session: String,
    /// tintin++ session name.
    pub game_session: String,
    pub game_host: String,
    pub game_port: u16,
    /// Files `#read` by the launch script.
    pub includes: Vec<String>,
    /// Pause between launching the client and enabling logging.
    pub warmup: Duration,
    /// Stop-signal polling interval.
    pub tick: Duration,
    /// Interval between keep-alive actions.
    pub keep_alive: Duration,
    pub presence_action: String,
    pub keep_alive_action: String,
    pub sign_off: Vec<String>,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            log_prefix: "scribe".to_string(),
            transcript_dir: PathBuf::from(DEFAULT_TRANSCRIPT_DIR),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            client_command: "tt++".to_string(),
            tmux_session: DEFAULT_SESSION.to_string(),
            game_session: DEFAULT_SESSION_NAME.to_string(),
            game_host: DEFAULT_GAME_HOST.to_string(),
            game_port: DEFAULT_GAME_PORT,
            includes: DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect(),
            warmup: Duration::from_secs(15),
            tick: Duration::from_secs(5),
            keep_alive: Duration::from_secs(180),
            presence_action: "inhale".to_string(),
            keep_alive_action: "scrib".to_string(),
            sign_off: vec!["nod".to_string(), "wave".to_string(), "exit".to_string()],
        }
    }
}

/// [`Recorder`] that runs the client under a [`Multiplexer`].
pub struct SessionController<M> {
    mux: M,
    settings: RecordingSettings,
}

impl<M: Multiplexer> SessionController<M> {
    pub fn new(mux: M, settings: RecordingSettings) -> Self {
        Self { mux, settings }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    fn send(&self, keys: &str) -> Result<()> {
        debug!(keys, "send-keys");
        self.mux.send_keys(&self.settings.tmux_session, keys, true)
    }

    /// Write the launch script and create the reserved session.
    fn prepare(&self, key: &SessionKey) -> Result<()> {
        let s = &self.settings;

        info!(path = %s.script_path.display(), "Writing launch script");
        LaunchScript::new(key)
            .server(&s.game_session, &s.game_host, s.game_port)
            .includes(s.includes.clone())
            .write_to(&s.script_path)?;

        self.mux.new_session(&s.tmux_session)
    }

    /// Launch the client and switch on plain-text logging.
    fn launch(&self, stop: &mut StopToken) -> Result<PathBuf> {
        let s = &self.settings;

        info!("Starting client in tmux");
        self.send(&format!(
            "{} {}",
            s.client_command,
            s.script_path.display()
        ))?;

        // A stop during warm-up latches and ends the loop on its first tick.
        stop.wait(s.warmup);

        let log_path = transcript_path(&s.transcript_dir, &s.log_prefix);
        self.send("#config log plain")?;
        self.send(&format!("#log overwrite {}", log_path.display()))?;
        info!(path = %log_path.display(), "Client is now logging");
        Ok(log_path)
    }

    /// Everything between session creation and sign-off.
    fn run(&self, stop: &mut StopToken) -> Result<PathBuf> {
        let log_path = self.launch(stop)?;

        match self.keep_alive_loop(stop)? {
            StopReason::Requested => {
                self.sign_off()?;
                Ok(log_path)
            }
            StopReason::Abandoned => {
                warn!(path = %log_path.display(), "Recording abandoned without sign-off");
                Err(ScribeError::Killed)
            }
        }
    }

    /// Poll the stop token each tick, sending keep-alives on schedule.
    fn keep_alive_loop(&self, stop: &mut StopToken) -> Result<StopReason> {
        let s = &self.settings;
        self.send(&s.presence_action)?;

        let mut elapsed = Duration::ZERO;
        let mut next_keep_alive = Duration::ZERO;
        loop {
            if elapsed >= next_keep_alive {
                self.send(&s.keep_alive_action)?;
                next_keep_alive += s.keep_alive.max(s.tick);
            }
            if let Some(reason) = stop.wait(s.tick) {
                return Ok(reason);
            }
            elapsed += s.tick;
        }
    }

    fn sign_off(&self) -> Result<()> {
        for action in &self.settings.sign_off {
            self.send(action)?;
        }
        match self.mux.kill_server()? {
            KillOutcome::Terminated => info!("Client exited cleanly, tmux server killed"),
            other => warn!(?other, "tmux server was already gone after sign-off"),
        }
        Ok(())
    }
}

impl<M: Multiplexer> Recorder for SessionController<M> {
    fn record(&self, key: SessionKey, mut stop: StopToken) -> Result<PathBuf> {
        self.prepare(&key)?;

        let result = self.run(&mut stop);
        match &result {
            // Whoever killed the run already tore the server down.
            Ok(_) | Err(ScribeError::Killed) => {}
            Err(e) => {
                warn!(error = %e, "Recording failed, tearing down tmux server");
                match self.mux.kill_server() {
                    Ok(outcome) if outcome.is_clean() => {}
                    Ok(outcome) => warn!(?outcome, "Could not tear down tmux server"),
                    Err(kill_err) => warn!(error = %kill_err, "Could not tear down tmux server"),
                }
            }
        }
        result
    }

    fn session_alive(&self) -> Result<bool> {
        self.mux.server_alive()
    }

    fn kill(&self) -> Result<KillOutcome> {
        self.mux.kill_server()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::stop::stop_channel;
    use crate::recording::transcript::is_transcript_name;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        NewSession(String),
        Keys(String, bool),
        Kill,
    }

    #[derive(Clone, Default)]
    struct FakeMux {
        calls: Arc<Mutex<Vec<Call>>>,
        /// Fail the send-keys call with this zero-based index.
        fail_send: Option<usize>,
    }

    impl FakeMux {
        fn failing_send(index: usize) -> Self {
            Self {
                fail_send: Some(index),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn keys(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Keys(k, _) => Some(k),
                    _ => None,
                })
                .collect()
        }
    }

    impl Multiplexer for FakeMux {
        fn new_session(&self, session: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::NewSession(session.to_string()));
            Ok(())
        }

        fn send_keys(&self, _session: &str, keys: &str, enter: bool) -> Result<()> {
            let mut calls = self.calls.lock().unwrap();
            let sent = calls.iter().filter(|c| matches!(c, Call::Keys(..))).count();
            if self.fail_send == Some(sent) {
                return Err(ScribeError::Multiplexer("send-keys failed".into()));
            }
            calls.push(Call::Keys(keys.to_string(), enter));
            Ok(())
        }

        fn server_alive(&self) -> Result<bool> {
            Ok(false)
        }

        fn kill_server(&self) -> Result<KillOutcome> {
            self.calls.lock().unwrap().push(Call::Kill);
            Ok(KillOutcome::Terminated)
        }
    }

    fn fast_settings(dir: &std::path::Path) -> RecordingSettings {
        RecordingSettings {
            log_prefix: "meeting".to_string(),
            transcript_dir: dir.join("temp"),
            script_path: dir.join("dr.tin"),
            warmup: Duration::from_millis(5),
            tick: Duration::from_millis(20),
            keep_alive: Duration::from_millis(60),
            ..RecordingSettings::default()
        }
    }

    #[test]
    fn test_default_cadence() {
        let settings = RecordingSettings::default();
        assert_eq!(settings.tick, Duration::from_secs(5));
        assert_eq!(settings.keep_alive, Duration::from_secs(180));
        assert_eq!(settings.sign_off, vec!["nod", "wave", "exit"]);
    }

    #[test]
    fn test_record_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let mux = FakeMux::default();
        let controller = SessionController::new(mux.clone(), fast_settings(dir.path()));
        let tick = controller.settings().tick;

        let (handle, token) = stop_channel();
        let worker = std::thread::spawn(move || {
            controller.record(SessionKey::new("abc123"), token)
        });

        std::thread::sleep(tick * 2 + Duration::from_millis(5));
        let stopped_at = Instant::now();
        handle.stop();
        let path = worker.join().unwrap().unwrap();
        assert!(stopped_at.elapsed() < tick * 3);

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(is_transcript_name(name, "meeting"), "bad name: {}", name);
        assert!(path.starts_with(dir.path().join("temp")));

        let script = std::fs::read_to_string(dir.path().join("dr.tin")).unwrap();
        assert!(script.contains(";abc123;;"));

        let calls = mux.calls();
        assert_eq!(calls[0], Call::NewSession(DEFAULT_SESSION.to_string()));
        assert_eq!(calls.last(), Some(&Call::Kill));

        let keys = mux.keys();
        assert!(keys[0].starts_with("tt++ "));
        assert_eq!(keys[1], "#config log plain");
        assert_eq!(keys[2], format!("#log overwrite {}", path.display()));
        assert_eq!(keys[3], "inhale");
        assert_eq!(keys[4], "scrib");
        assert_eq!(&keys[keys.len() - 3..], ["nod", "wave", "exit"]);
    }

    #[test]
    fn test_keep_alive_follows_period() {
        let dir = tempfile::tempdir().unwrap();
        let mux = FakeMux::default();
        let settings = RecordingSettings {
            warmup: Duration::ZERO,
            tick: Duration::from_millis(10),
            keep_alive: Duration::from_secs(3600),
            ..fast_settings(dir.path())
        };
        let controller = SessionController::new(mux.clone(), settings);

        let (handle, token) = stop_channel();
        let worker = std::thread::spawn(move || {
            controller.record(SessionKey::new("k"), token)
        });
        std::thread::sleep(Duration::from_millis(60));
        handle.stop();
        worker.join().unwrap().unwrap();

        let scribs = mux.keys().iter().filter(|k| *k == "scrib").count();
        assert_eq!(scribs, 1);
    }

    #[test]
    fn test_abandoned_run_skips_sign_off() {
        let dir = tempfile::tempdir().unwrap();
        let mux = FakeMux::default();
        let controller = SessionController::new(mux.clone(), fast_settings(dir.path()));

        let (handle, token) = stop_channel();
        drop(handle);
        let result = controller.record(SessionKey::new("k"), token);

        assert!(matches!(result, Err(ScribeError::Killed)));
        assert!(!mux.keys().iter().any(|k| k == "nod"));
        assert!(!mux.calls().contains(&Call::Kill));
    }

    #[test]
    fn test_failed_send_tears_down_server() {
        let dir = tempfile::tempdir().unwrap();
        // 0: tt++, 1-2: logging, 3: inhale, 4: scrib, 5: fails on the first repeat.
        for index in [0, 2, 5] {
            let mux = FakeMux::failing_send(index);
            let controller = SessionController::new(mux.clone(), fast_settings(dir.path()));

            let (_handle, token) = stop_channel();
            let result = controller.record(SessionKey::new("k"), token);

            assert!(matches!(result, Err(ScribeError::Multiplexer(_))), "index {}", index);
            assert_eq!(mux.calls().last(), Some(&Call::Kill), "index {}", index);
            assert_eq!(mux.keys().len(), index);
        }
    }

    #[test]
    fn test_failed_sign_off_tears_down_server() {
        let dir = tempfile::tempdir().unwrap();
        let settings = RecordingSettings {
            keep_alive: Duration::from_secs(3600),
            ..fast_settings(dir.path())
        };
        // tt++, two logging lines, inhale, scrib, then "nod" fails.
        let mux = FakeMux::failing_send(5);
        let controller = SessionController::new(mux.clone(), settings);

        let (handle, token) = stop_channel();
        handle.stop();
        let result = controller.record(SessionKey::new("k"), token);

        assert!(result.is_err());
        let kills = mux.calls().iter().filter(|c| **c == Call::Kill).count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_kill_delegates_to_mux() {
        let mux = FakeMux::default();
        let controller = SessionController::new(mux.clone(), RecordingSettings::default());
        assert_eq!(controller.kill().unwrap(), KillOutcome::Terminated);
        assert!(!controller.session_alive().unwrap());
        assert_eq!(mux.calls(), vec![Call::Kill]);
    }
}
