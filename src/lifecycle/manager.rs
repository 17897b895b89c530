//! Start/stop coordination for the single recording session.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::notify::{Notification, Notifier};
use super::state::LifecycleState;
use crate::auth::{Authenticator, Credentials, SessionKey};
use crate::error::ScribeError;
use crate::recording::{stop_channel, KillOutcome, Recorder, StopHandle};
use crate::Result;

/// Retry and wait bounds for the lifecycle manager.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Total login attempts before giving up.
    pub auth_attempts: u32,
    /// Number of checks for a previous recording to finish.
    pub stop_poll_attempts: u32,
    /// Pause between those checks.
    pub stop_poll_interval: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            auth_attempts: 3,
            stop_poll_attempts: 12,
            stop_poll_interval: Duration::from_secs(15),
        }
    }
}

/// How a call to [`LifecycleManager::start`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The recording ran to its sign-off and the transcript was delivered.
    Completed(PathBuf),
    /// No session key could be obtained; nothing was launched.
    AuthFailed,
    /// The recording was launched but did not finish cleanly.
    RecordingFailed,
}

/// The run currently owned by the manager.
struct ActiveRun {
    generation: u64,
    stop: StopHandle,
}

/// Owns the start/stop lifecycle of the one recording session.
///
/// `start` calls are serialised by an internal lock that is held until the
/// recording has been launched; a second `start` that arrives while a
/// recording runs stops it first.
pub struct LifecycleManager {
    credentials: Arc<Credentials>,
    authenticator: Arc<dyn Authenticator>,
    recorder: Arc<dyn Recorder>,
    settings: LifecycleSettings,
    startup_lock: tokio::sync::Mutex<()>,
    state: watch::Sender<LifecycleState>,
    active: Mutex<Option<ActiveRun>>,
    generation: AtomicU64,
}

impl LifecycleManager {
    pub fn new<A, R>(
        credentials: Credentials,
        authenticator: A,
        recorder: R,
        settings: LifecycleSettings,
    ) -> Self
    where
        A: Authenticator,
        R: Recorder,
    {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self {
            credentials: Arc::new(credentials),
            authenticator: Arc::new(authenticator),
            recorder: Arc::new(recorder),
            settings,
            startup_lock: tokio::sync::Mutex::new(()),
            state,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Log in, record until stopped, then deliver the transcript.
    ///
    /// Resolves when the recording has ended. Every caller-visible failure is
    /// reported as a single notification.
    pub async fn start<N>(&self, notifier: &N) -> StartOutcome
    where
        N: Notifier + ?Sized,
    {
        let guard = self.startup_lock.lock().await;

        self.clear_previous().await;

        if let Err(e) = self.transition(LifecycleState::Authenticating) {
            error!(error = %e, "Cannot begin authentication");
            notifier.notify(Notification::auth_failed()).await;
            return StartOutcome::AuthFailed;
        }

        let key = match self.authenticate_with_retry().await {
            Ok(key) => key,
            Err(e) => {
                error!(error = %e, "Authentication gave up");
                self.reset_from(LifecycleState::Authenticating);
                notifier.notify(Notification::auth_failed()).await;
                return StartOutcome::AuthFailed;
            }
        };

        let (handle, token) = stop_channel();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.active_run() = Some(ActiveRun {
            generation,
            stop: handle,
        });

        if let Err(e) = self.transition(LifecycleState::Recording) {
            // A kill landed while we were logging in.
            warn!(error = %e, "Start was cancelled before recording began");
            self.finish(generation);
            notifier.notify(Notification::recording_failed()).await;
            return StartOutcome::RecordingFailed;
        }

        notifier.notify(Notification::starting()).await;

        let recorder = Arc::clone(&self.recorder);
        let task = tokio::task::spawn_blocking(move || recorder.record(key, token));
        drop(guard);

        let result = task.await.map_err(ScribeError::from).and_then(|r| r);
        self.finish(generation);

        match result {
            Ok(path) => {
                info!(path = %path.display(), "Delivering transcript");
                notifier.notify(Notification::transcript(path.clone())).await;
                StartOutcome::Completed(path)
            }
            Err(e) => {
                error!(error = %e, "Recording ended without a transcript");
                notifier.notify(Notification::recording_failed()).await;
                StartOutcome::RecordingFailed
            }
        }
    }

    /// Ask a running recording to sign off.
    ///
    /// Returns `false`, without notifying, when nothing is recording.
    pub async fn stop<N>(&self, notifier: &N) -> bool
    where
        N: Notifier + ?Sized,
    {
        if self.transition(LifecycleState::Stopping).is_err() {
            return false;
        }
        notifier.notify(Notification::stopping()).await;
        self.signal_stop();
        true
    }

    /// Tear down the reserved session and return to Idle.
    ///
    /// Never fails: a session that is already gone counts as success, and
    /// any other failure is logged and reported in the outcome.
    pub async fn kill(&self) -> KillOutcome {
        let recorder = Arc::clone(&self.recorder);
        let outcome = match tokio::task::spawn_blocking(move || recorder.kill()).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => KillOutcome::Failed(e.to_string()),
            Err(e) => KillOutcome::Failed(e.to_string()),
        };

        match &outcome {
            KillOutcome::Terminated => info!("Killed recording session"),
            KillOutcome::AlreadyAbsent => info!("No recording session to kill"),
            KillOutcome::Failed(reason) => warn!(reason, "Kill failed"),
        }

        // Dropping the stop handle unblocks a loop that is still polling.
        self.active_run().take();
        self.state.send_replace(LifecycleState::Idle);
        outcome
    }

    /// Make sure no earlier session survives into the next one.
    async fn clear_previous(&self) {
        if self.state().is_active() {
            info!("Currently recording, attempting to exit cleanly");
            self.request_stop();

            for _ in 0..self.settings.stop_poll_attempts {
                if self.state().is_idle() {
                    break;
                }
                info!("Awaiting a clean exit");
                tokio::time::sleep(self.settings.stop_poll_interval).await;
            }

            if !self.state().is_idle() {
                warn!("Previous recording did not exit cleanly, killing it");
                self.kill().await;
            }
            return;
        }

        let recorder = Arc::clone(&self.recorder);
        match tokio::task::spawn_blocking(move || recorder.session_alive()).await {
            Ok(Ok(true)) => {
                info!("Found a lingering recording session, maybe from a prior run");
                if let KillOutcome::Failed(reason) = self.kill().await {
                    warn!(reason, "Could not clear stale session, continuing anyway");
                }
            }
            Ok(Ok(false)) => {}
            Ok(Err(e)) => warn!(error = %e, "Could not probe for a stale session"),
            Err(e) => warn!(error = %e, "Stale session probe panicked"),
        }
    }

    async fn authenticate_with_retry(&self) -> Result<SessionKey> {
        let attempts = self.settings.auth_attempts.max(1);
        let mut attempt = 1;
        loop {
            let authenticator = Arc::clone(&self.authenticator);
            let credentials = Arc::clone(&self.credentials);
            let result =
                tokio::task::spawn_blocking(move || authenticator.authenticate(&credentials))
                    .await?;

            match result {
                Ok(key) => return Ok(key),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(
                        error = %e,
                        remaining = attempts - attempt,
                        "Authentication failed, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Move Recording -> Stopping and signal the loop.
    fn request_stop(&self) -> bool {
        if self.transition(LifecycleState::Stopping).is_err() {
            return false;
        }
        self.signal_stop();
        true
    }

    fn signal_stop(&self) {
        if let Some(run) = self.active_run().as_ref() {
            run.stop.stop();
        }
        info!("Attempting to stop cleanly");
    }

    /// Lock the active run, recovering the guard if a holder panicked.
    fn active_run(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(|poisoned| {
            warn!("Active run lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Release a finished run, unless a kill or a newer run replaced it.
    fn finish(&self, generation: u64) {
        let owned = {
            let mut active = self.active_run();
            if active.as_ref().map(|r| r.generation) == Some(generation) {
                active.take();
                true
            } else {
                false
            }
        };
        if owned {
            self.state.send_replace(LifecycleState::Idle);
        }
    }

    fn reset_from(&self, from: LifecycleState) {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = LifecycleState::Idle;
                true
            } else {
                false
            }
        });
    }

    fn transition(&self, to: LifecycleState) -> Result<()> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| match state.transition_to(to) {
            Ok(()) => true,
            Err(e) => {
                result = Err(e);
                false
            }
        });
        result
    }
}
