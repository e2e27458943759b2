//! Ticking driver background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task that advances every running timer once per `period`.
///
/// A single interval drives all timers; a timer drops out of the pass as soon
/// as it stops running. Never returns.
pub async fn ticking_driver_task(state: Arc<AppState>, period: Duration) {
    info!("Starting ticking driver ({}ms period)", period.as_millis());

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        match state.tick_running() {
            Ok(events) if !events.is_empty() => {
                debug!("Tick pass finished {} timer(s)", events.len());
            }
            Ok(_) => {}
            Err(e) => {
                error!("Tick pass failed: {}", e);
            }
        }
    }
}
