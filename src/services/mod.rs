//! Collaborators around the timer store
//!
//! Form validation, the notification sink contract, and the alert board that
//! backs the default sink.

pub mod alerts;
pub mod notifier;
pub mod validation;

// Re-export main types
pub use alerts::{Alert, AlertBoard, AlertKind, AlertNotifier, SoundConfig};
pub use notifier::{NotificationSink, RecordingNotifier};
pub use validation::{check_timer_form, validate_timer_form, TimerForm, ValidationError};
