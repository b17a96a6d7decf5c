use std::sync::Mutex;

use serde::Serialize;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Where page controllers send user-facing messages. How they are shown
/// (toast, alert, response field, log line) is up to the implementation.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: String) {
        self.notify(Notification {
            level: Level::Success,
            message,
        });
    }

    fn error(&self, message: String) {
        self.notify(Notification {
            level: Level::Error,
            message,
        });
    }

    fn info(&self, message: String) {
        self.notify(Notification {
            level: Level::Info,
            message,
        });
    }
}

/// Buffers notifications so a handler can return them with its response.
/// Every notification is also logged.
#[derive(Debug, Default)]
pub struct CollectingSink {
    items: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<Notification> {
        match self.items.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notification: Notification) {
        TracingSink.notify(notification.clone());
        match self.items.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Error => tracing::warn!("notification: {}", notification.message),
            Level::Success | Level::Info => {
                tracing::info!("notification: {}", notification.message)
            }
        }
    }
}
