//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod notification_dispatcher;
pub mod ticking_driver;

// Re-export main functions
pub use notification_dispatcher::{dispatch, notification_dispatcher_task};
pub use ticking_driver::ticking_driver_task;
