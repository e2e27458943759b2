//! Delivers timer events to the notification sink

use std::sync::Arc;
use tracing::{info, warn};

use crate::state::{AppState, TimerEvent};

/// Background task that turns expiry events into user notifications.
/// Sink failures are logged and never reach the ticking side.
pub async fn notification_dispatcher_task(state: Arc<AppState>) {
    let Some(mut event_rx) = state.take_event_receiver() else {
        warn!("Timer events already have a consumer, dispatcher not started");
        return;
    };

    info!("Starting notification dispatcher");

    while let Some(event) = event_rx.recv().await {
        dispatch(&state, &event);
    }

    info!("Timer event channel closed, stopping dispatcher");
}

/// Route a single event to the sink
pub fn dispatch(state: &AppState, event: &TimerEvent) {
    match event {
        TimerEvent::Expired { id, title } => {
            info!("Timer {} \"{}\" has ended", id, title);
            if let Err(e) = state.notifier.notify_expired(title) {
                warn!("Failed to notify expiry of \"{}\": {}", title, e);
            }
        }
    }
}
