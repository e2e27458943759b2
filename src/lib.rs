//! Multi Timer - Persistent countdown timers with expiry alerts
//!
//! This library provides the timer store and its state machine, snapshot
//! persistence, a shared ticking driver, and the notification plumbing that
//! alerts the user when a timer reaches zero.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, Timer, TimerStore};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
