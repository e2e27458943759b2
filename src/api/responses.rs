//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{services::Alert, state::Timer, utils::format_hms};

/// A timer as the UI renders it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    #[serde(flatten)]
    pub timer: Timer,
    /// Remaining time as `HH:MM:SS`
    pub display: String,
}

impl From<Timer> for TimerView {
    fn from(timer: Timer) -> Self {
        let display = format_hms(timer.remaining_time);
        Self { timer, display }
    }
}

/// API response structure for timer endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timers: Vec<TimerView>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timers: Vec<Timer>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timers: timers.into_iter().map(TimerView::from).collect(),
        }
    }

    pub fn ok(message: String, timers: Vec<Timer>) -> Self {
        Self::new("ok".to_string(), message, timers)
    }

    /// Response for a rejected form; carries the diagnostic verbatim
    pub fn rejected(message: String, timers: Vec<Timer>) -> Self {
        Self::new("rejected".to_string(), message, timers)
    }
}

/// Active alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
}

/// Result of dismissing an alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissResponse {
    pub id: Uuid,
    pub dismissed: bool,
}

/// Service status with timer counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timers: usize,
    pub running: usize,
    pub expired: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
