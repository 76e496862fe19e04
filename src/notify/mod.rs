//! Notification sinks for infection notices.

use crate::core::NotificationSink;

use std::sync::{Arc, Mutex, PoisonError};

/// An arc-wrapped notification sink for shared ownership.
pub type ArcNotifier = Arc<dyn NotificationSink>;

/// Logs the notice instead of mailing it.
///
/// Useful where no mail transport is configured.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier {
    recipient: Option<String>,
}

impl TracingNotifier {
    /// Creates a notifier with no explicit recipient.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipient shown in the log line.
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }
}

impl NotificationSink for TracingNotifier {
    fn send_mail(&self, path: &str) {
        tracing::warn!(
            target: "scanwarden::notify",
            path = %path,
            recipient = ?self.recipient,
            "Malware found, notification issued"
        );
    }
}

/// Remembers every path a notice was sent for.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notified paths in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many notices were sent.
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl NotificationSink for RecordingNotifier {
    fn send_mail(&self, path: &str) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
