//! Status messages sent back to whoever asked for a start or stop.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Broad outcome a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Something is under way.
    Progress,
    /// The recording finished and the transcript is attached.
    Success,
    /// The request did not work out.
    Failure,
}

/// A human-readable status message, optionally carrying a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<PathBuf>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            transcript: None,
        }
    }

    pub fn starting() -> Self {
        Self::new(
            NotificationKind::Progress,
            "😸  💬   I'll tell the troupe scribe that a meeting is starting!",
        )
    }

    pub fn stopping() -> Self {
        Self::new(
            NotificationKind::Progress,
            "😸  💬   I'll tell the troupe scribe that the meeting is over!",
        )
    }

    pub fn auth_failed() -> Self {
        Self::new(
            NotificationKind::Failure,
            "😿  💬   Uhoh... Something went wrong, and the scribe didn't wake up...",
        )
    }

    pub fn recording_failed() -> Self {
        Self::new(
            NotificationKind::Failure,
            "😿  💬   Uhoh... The scribe dropped the quill before the meeting ended...",
        )
    }

    pub fn transcript(path: PathBuf) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: "😸  ✉️   Meeting adjourned! Here's the log!".to_string(),
            transcript: Some(path),
        }
    }
}

/// Destination for status notifications.
///
/// Delivery is best effort; a notifier that cannot deliver logs the problem
/// rather than failing the lifecycle operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Notifier that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Failure => error!(message = %notification.message, "Notification"),
            _ => info!(
                message = %notification.message,
                transcript = ?notification.transcript,
                "Notification"
            ),
        }
    }
}

/// Notifier that forwards into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

/// A notification as kept by [`FeedNotifier`].
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    /// Monotonic sequence number.
    pub seq: u64,
    /// Seconds since the Unix epoch.
    pub at: u64,
    #[serde(flatten)]
    pub notification: Notification,
}

/// Keeps the most recent notifications for later retrieval.
#[derive(Debug)]
pub struct FeedNotifier {
    capacity: usize,
    inner: Mutex<Feed>,
}

#[derive(Debug, Default)]
struct Feed {
    next_seq: u64,
    entries: VecDeque<FeedEntry>,
}

impl FeedNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Feed::default()),
        }
    }

    /// Entries with a sequence number above `after`, oldest first.
    pub fn since(&self, after: Option<u64>) -> Vec<FeedEntry> {
        let Ok(feed) = self.inner.lock() else {
            return Vec::new();
        };
        feed.entries
            .iter()
            .filter(|e| after.map_or(true, |a| e.seq > a))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|f| f.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, notification: Notification) {
        let at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if let Ok(mut feed) = self.inner.lock() {
            feed.next_seq += 1;
            let seq = feed.next_seq;
            feed.entries.push_back(FeedEntry {
                seq,
                at,
                notification,
            });
            while feed.entries.len() > self.capacity {
                feed.entries.pop_front();
            }
        }
    }
}

impl Default for FeedNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Notifier for FeedNotifier {
    async fn notify(&self, notification: Notification) {
        LogNotifier.notify(notification.clone()).await;
        self.push(notification);
    }
}
