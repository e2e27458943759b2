//! Multi Timer - Persistent countdown timers with expiry alerts
//!
//! This is the main entry point for the multi-timer service.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use multi_timer::{
    api::create_router,
    config::Config,
    services::{AlertBoard, AlertNotifier},
    state::AppState,
    storage::{JsonFileStorage, MemoryStorage, SnapshotStorage},
    tasks::{notification_dispatcher_task, ticking_driver_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("multi_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting multi-timer v{}", env!("CARGO_PKG_VERSION"));

    let storage: Arc<dyn SnapshotStorage> = if config.ephemeral {
        info!("Ephemeral mode: timers live for this session only");
        Arc::new(MemoryStorage::new())
    } else {
        let storage = JsonFileStorage::new(config.data_dir());
        info!("Timer snapshot directory: {}", storage.dir().display());
        Arc::new(storage)
    };

    let sound = config.sound();
    match &sound {
        Some(sound) => info!("Expiry sound: {} {}", sound.player, sound.file.display()),
        None => info!("No expiry sound configured"),
    }

    info!("Alerts expire after {}s unless a sound is playing", config.alert_ttl().as_secs());
    let alerts = Arc::new(AlertBoard::with_ttl(config.alert_ttl()));
    let notifier = Arc::new(AlertNotifier::new(Arc::clone(&alerts), sound));

    // Create application state, rehydrating saved timers
    let state = Arc::new(AppState::init(
        storage,
        notifier,
        config.port,
        config.host.clone(),
    ));

    // Deliver expiry notifications
    let dispatcher_state = Arc::clone(&state);
    tokio::spawn(async move {
        notification_dispatcher_task(dispatcher_state).await;
    });

    // Drive every running timer from one shared interval
    let ticking_state = Arc::clone(&state);
    let period = config.tick_period();
    tokio::spawn(async move {
        ticking_driver_task(ticking_state, period).await;
    });

    let app = create_router(Arc::clone(&state), alerts);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers             - List timers");
    info!("  POST   /timers             - Add a timer");
    info!("  PUT    /timers/:id         - Edit a timer");
    info!("  DELETE /timers/:id         - Delete a timer");
    info!("  POST   /timers/:id/toggle  - Start or pause a timer");
    info!("  POST   /timers/:id/restart - Restart a timer");
    info!("  GET    /alerts             - List alerts");
    info!("  POST   /alerts/:id/dismiss - Dismiss an alert");
    info!("  GET    /status             - Service status");
    info!("  GET    /health             - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = state.persist() {
        error!("Final snapshot failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
