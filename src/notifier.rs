//! User-facing notifications.
//!
//! Desktop notifications belong to the embedding application; the config
//! layer only needs somewhere to send "file missing" and "reloaded" messages.

use parking_lot::Mutex;
use tracing::info;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, message, "Notification");
    }
}

/// Keeps every notification in memory; useful in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(title, message)` pairs, oldest first.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.sent.lock().push((title.to_string(), message.to_string()));
    }
}
