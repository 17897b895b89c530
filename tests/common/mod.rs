//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use troupe_scribe::auth::{AuthError, AuthStage, Authenticator, Credentials, SessionKey};
use troupe_scribe::recording::{KillOutcome, Multiplexer, RecordingSettings};

pub fn credentials() -> Credentials {
    Credentials::new("bard", "hunter2", "Ragge")
}

/// Authenticator that fails with a transport error a set number of times.
#[derive(Clone, Default)]
pub struct FakeAuth {
    pub failures: usize,
    pub calls: Arc<AtomicUsize>,
}

impl FakeAuth {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Authenticator for FakeAuth {
    fn authenticate(&self, _credentials: &Credentials) -> Result<SessionKey, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(AuthError::Transport {
                stage: AuthStage::Connect,
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        Ok(SessionKey::new("a1b2c3"))
    }
}

/// One interaction with the fake multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    NewSession(String),
    Keys(String),
    Kill,
}

/// Multiplexer that records what it was asked to do.
#[derive(Clone, Default)]
pub struct FakeMux {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub alive: Arc<AtomicBool>,
}

impl FakeMux {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Keys(k) => Some(k),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, keys: &str) -> usize {
        self.keys().iter().filter(|k| *k == keys).count()
    }
}

impl Multiplexer for FakeMux {
    fn new_session(&self, session: &str) -> troupe_scribe::Result<()> {
        self.alive.store(true, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push(Call::NewSession(session.to_string()));
        Ok(())
    }

    fn send_keys(&self, _session: &str, keys: &str, _enter: bool) -> troupe_scribe::Result<()> {
        self.calls.lock().unwrap().push(Call::Keys(keys.to_string()));
        Ok(())
    }

    fn server_alive(&self) -> troupe_scribe::Result<bool> {
        Ok(self.alive.load(Ordering::SeqCst))
    }

    fn kill_server(&self) -> troupe_scribe::Result<KillOutcome> {
        self.calls.lock().unwrap().push(Call::Kill);
        if self.alive.swap(false, Ordering::SeqCst) {
            Ok(KillOutcome::Terminated)
        } else {
            Ok(KillOutcome::AlreadyAbsent)
        }
    }
}

/// Recording settings with millisecond timings rooted in `dir`.
pub fn fast_settings(dir: &Path) -> RecordingSettings {
    RecordingSettings {
        log_prefix: "troupe".to_string(),
        transcript_dir: dir.join("tt/temp"),
        script_path: dir.join("dr.tin"),
        warmup: Duration::from_millis(10),
        tick: Duration::from_millis(20),
        keep_alive: Duration::from_millis(60),
        ..RecordingSettings::default()
    }
}
