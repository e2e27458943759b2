//! Signal handling for graceful shutdown

use signal_hook_tokio::Signals;
use futures::stream::StreamExt;
use tracing::{info, warn};

/// Wait for SIGTERM or SIGINT, returning the signal number received.
/// Falls back to Ctrl-C if the signal stream cannot be registered.
pub async fn shutdown_signal() -> Option<i32> {
    let signals = Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ]);

    match signals {
        Ok(mut signals) => {
            let signal = signals.next().await;
            if let Some(signal) = signal {
                info!("Received signal: {}", signal);
            }
            signal
        }
        Err(e) => {
            warn!("Failed to register signal handler ({}), waiting for Ctrl-C", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            None
        }
    }
}
