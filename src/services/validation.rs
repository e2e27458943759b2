//! Timer form validation

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::notifier::NotificationSink;
use crate::state::{timer::MAX_DURATION_SECS, TimerSpec, TimerUpdates};

/// Longest accepted title, in characters
pub const MAX_TITLE_CHARS: usize = 50;

/// Raw user input for creating or editing a timer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub seconds: i64,
}

/// Reason a form was rejected. The display text is shown to the user verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title required")]
    TitleRequired,
    #[error("title too long")]
    TitleTooLong,
    #[error("negative time")]
    NegativeTime,
    #[error("minutes/seconds out of range")]
    OutOfRange,
    #[error("zero duration")]
    ZeroDuration,
    #[error("duration too long")]
    DurationTooLong,
}

impl TimerForm {
    pub fn new(title: impl Into<String>, hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            hours,
            minutes,
            seconds,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    fn trimmed_title(&self) -> String {
        self.title.trim().to_string()
    }

    fn trimmed_description(&self) -> Option<String> {
        let description = self.description.trim();
        if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        }
    }

    /// Build an `add` input from an accepted form
    pub fn into_spec(self) -> Result<TimerSpec, ValidationError> {
        let duration = validate_timer_form(&self)?;
        Ok(TimerSpec::new(self.trimmed_title(), self.trimmed_description(), duration))
    }

    /// Build an `edit` input from an accepted form
    pub fn into_updates(self) -> Result<TimerUpdates, ValidationError> {
        let duration = validate_timer_form(&self)?;
        Ok(TimerUpdates {
            title: Some(self.trimmed_title()),
            description: Some(self.trimmed_description()),
            duration: Some(duration),
        })
    }
}

/// Check a form, returning the total duration in seconds on success.
/// Rules are evaluated in order and the first failure wins.
pub fn validate_timer_form(form: &TimerForm) -> Result<u32, ValidationError> {
    if form.title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }

    if form.title.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong);
    }

    if form.hours < 0 || form.minutes < 0 || form.seconds < 0 {
        return Err(ValidationError::NegativeTime);
    }

    if form.minutes > 59 || form.seconds > 59 {
        return Err(ValidationError::OutOfRange);
    }

    // Saturate so absurd hour counts land in the too-long branch
    let total = form
        .hours
        .saturating_mul(3600)
        .saturating_add(form.minutes * 60 + form.seconds);

    if total == 0 {
        return Err(ValidationError::ZeroDuration);
    }

    if total > i64::from(MAX_DURATION_SECS) {
        return Err(ValidationError::DurationTooLong);
    }

    Ok(total as u32)
}

/// Validate and report a rejection through the sink. Returns whether the form was accepted.
pub fn check_timer_form(form: &TimerForm, sink: &dyn NotificationSink) -> bool {
    match validate_timer_form(form) {
        Ok(total) => {
            debug!("Timer form accepted: {:?} ({}s)", form.title, total);
            true
        }
        Err(reason) => {
            debug!("Timer form rejected: {}", reason);
            if let Err(e) = sink.notify_validation_error(&reason.to_string()) {
                warn!("Failed to surface validation error: {}", e);
            }
            false
        }
    }
}
