//! Cooperative stop signal for the recording loop.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Why a [`StopToken`] stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// [`StopHandle::stop`] was called.
    Requested,
    /// Every handle was dropped without a stop request.
    Abandoned,
}

/// Create a connected handle/token pair.
pub fn stop_channel() -> (StopHandle, StopToken) {
    let (tx, rx) = mpsc::channel();
    (
        StopHandle { tx },
        StopToken {
            rx,
            reason: None,
        },
    )
}

/// Caller side: requests a graceful stop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Ask the recording loop to wind down. Repeated calls are harmless.
    pub fn stop(&self) {
        let _ = self.tx.send(());
    }
}

/// Loop side: observed once per tick.
#[derive(Debug)]
pub struct StopToken {
    rx: Receiver<()>,
    reason: Option<StopReason>,
}

impl StopToken {
    /// Block for up to `timeout`, returning early once a stop is signalled.
    ///
    /// The reason latches: later calls return it immediately.
    pub fn wait(&mut self, timeout: Duration) -> Option<StopReason> {
        if self.reason.is_none() {
            self.reason = match self.rx.recv_timeout(timeout) {
                Ok(()) => Some(StopReason::Requested),
                Err(RecvTimeoutError::Disconnected) => Some(StopReason::Abandoned),
                Err(RecvTimeoutError::Timeout) => None,
            };
        }
        self.reason
    }

    /// Non-blocking check.
    #[cfg(test)]
    pub fn poll(&mut self) -> Option<StopReason> {
        self.wait(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_times_out_without_signal() {
        let (_handle, mut token) = stop_channel();
        assert_eq!(token.wait(Duration::from_millis(10)), None);
        assert_eq!(token.poll(), None);
    }

    #[test]
    fn test_stop_wakes_waiter_early() {
        let (handle, mut token) = stop_channel();
        let waiter = std::thread::spawn(move || {
            let start = Instant::now();
            let reason = token.wait(Duration::from_secs(10));
            (reason, start.elapsed())
        });
        std::thread::sleep(Duration::from_millis(20));
        handle.stop();

        let (reason, elapsed) = waiter.join().unwrap();
        assert_eq!(reason, Some(StopReason::Requested));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_dropped_handle_abandons() {
        let (handle, mut token) = stop_channel();
        drop(handle);
        assert_eq!(token.poll(), Some(StopReason::Abandoned));
    }

    #[test]
    fn test_reason_latches() {
        let (handle, mut token) = stop_channel();
        handle.stop();
        assert_eq!(token.poll(), Some(StopReason::Requested));
        drop(handle);
        assert_eq!(token.poll(), Some(StopReason::Requested));
    }
}
