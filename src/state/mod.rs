//! State management module
//!
//! The timer entity, the pure timer store, and the shared application state
//! that wraps the store with locking, persistence and event fan-out.

pub mod app_state;
pub mod timer;
pub mod timer_store;

// Re-export main types
pub use app_state::AppState;
pub use timer::{Timer, TimerEvent, TimerSpec, TimerUpdates};
pub use timer_store::TimerStore;
