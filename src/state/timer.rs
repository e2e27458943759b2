//! Timer entity and the inputs/outputs of store operations

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest duration a timer may be configured with (24 hours)
pub const MAX_DURATION_SECS: u32 = 86_400;

/// One countdown instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Total configured seconds
    pub duration: u32,
    pub remaining_time: u32,
    pub is_running: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Timer {
    /// Stamp a new timer from a spec. Remaining time is clamped to the duration.
    pub fn from_spec(spec: TimerSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: spec.title,
            description: spec.description,
            duration: spec.duration,
            remaining_time: spec.remaining_time.min(spec.duration),
            is_running: spec.is_running,
            // Millisecond precision so the persisted form round-trips exactly
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// True once the countdown has reached zero
    pub fn is_expired(&self) -> bool {
        self.remaining_time == 0
    }

    /// Reset progress and pause
    pub fn reset(&mut self) {
        self.remaining_time = self.duration;
        self.is_running = false;
    }
}

/// Everything `add` needs except the stamped id and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: u32,
    pub remaining_time: u32,
    #[serde(default)]
    pub is_running: bool,
}

impl TimerSpec {
    /// A fresh, paused spec with the full duration remaining
    pub fn new(title: impl Into<String>, description: Option<String>, duration: u32) -> Self {
        Self {
            title: title.into(),
            description,
            duration,
            remaining_time: duration,
            is_running: false,
        }
    }
}

/// Partial update applied by `edit`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerUpdates {
    pub title: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub duration: Option<u32>,
}

/// Signal produced by a state transition that somebody outside the store must act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    Expired { id: Uuid, title: String },
}
