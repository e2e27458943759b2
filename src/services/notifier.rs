//! Notification sink contract

use std::sync::Mutex;

use crate::error::NotifyError;

/// Where expiry and validation messages go
pub trait NotificationSink: Send + Sync {
    /// A timer reached zero: play the alert sound and show a dismissable message
    fn notify_expired(&self, title: &str) -> Result<(), NotifyError>;

    /// Show a form diagnostic verbatim
    fn notify_validation_error(&self, message: &str) -> Result<(), NotifyError>;
}

/// Sink that only remembers what it was asked to show.
/// Handy for embedding without a UI and for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    expired: Mutex<Vec<String>>,
    validation_errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles of expired timers, in notification order
    pub fn expired(&self) -> Vec<String> {
        self.expired.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn validation_errors(&self) -> Vec<String> {
        self.validation_errors.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify_expired(&self, title: &str) -> Result<(), NotifyError> {
        self.expired
            .lock()
            .map_err(|e| NotifyError::Board(e.to_string()))?
            .push(title.to_string());
        Ok(())
    }

    fn notify_validation_error(&self, message: &str) -> Result<(), NotifyError> {
        self.validation_errors
            .lock()
            .map_err(|e| NotifyError::Board(e.to_string()))?
            .push(message.to_string());
        Ok(())
    }
}
