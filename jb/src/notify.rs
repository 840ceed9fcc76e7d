//! User-visible notifications
//!
//! The coordinator and the board raise short toast-style messages through a
//! [`Notifier`]. How they reach the user is up to whoever subscribes: the CLI
//! prints them, tests count them.

use std::fmt;

use tokio::sync::broadcast;
use tracing::debug;

/// Default channel capacity (notifications)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Success => f.write_str("success"),
            Level::Error => f.write_str("error"),
        }
    }
}

/// A message meant for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Broadcast fan-out of notifications
///
/// Fire-and-forget: with no subscribers the notification is dropped.
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "NotificationBus::new: creating notification bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Receive every notification raised after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        debug!("NotificationBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl Notifier for NotificationBus {
    fn notify(&self, notification: Notification) {
        debug!(level = %notification.level, message = %notification.message, "NotificationBus::notify");
        let _ = self.tx.send(notification);
    }
}
