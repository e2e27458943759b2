//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{Timer, TimerEvent, TimerSpec, TimerStore, TimerUpdates};
use crate::{
    services::{check_timer_form, NotificationSink, TimerForm},
    storage::{Snapshot, SnapshotStorage},
};

/// Owned timer service: the store behind a single lock, plus persistence,
/// event fan-out and the notification sink
pub struct AppState {
    /// Timer collection; every mutation happens under this lock
    pub store: Arc<Mutex<TimerStore>>,
    storage: Arc<dyn SnapshotStorage>,
    pub notifier: Arc<dyn NotificationSink>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Serializes snapshot writes so they land in mutation order
    persist_guard: Mutex<()>,
    /// Channel for timer events (expiries); unbounded so none are dropped
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    /// Single consumer end, handed out once to the dispatcher
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<TimerEvent>>>,
}

impl AppState {
    /// Build the state, rehydrating the collection from storage.
    /// An unreadable snapshot is logged and replaced by an empty collection.
    pub fn init(
        storage: Arc<dyn SnapshotStorage>,
        notifier: Arc<dyn NotificationSink>,
        port: u16,
        host: String,
    ) -> Self {
        let store = match Snapshot::read_from(storage.as_ref()) {
            Ok(snapshot) => {
                let store = TimerStore::from_timers(snapshot.timers);
                info!(
                    "Restored {} timers ({} running)",
                    store.len(),
                    store.running_count()
                );
                store
            }
            Err(e) => {
                error!("Failed to restore timers, starting empty: {}", e);
                TimerStore::new()
            }
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            store: Arc::new(Mutex::new(store)),
            storage,
            notifier,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            persist_guard: Mutex::new(()),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
        }
    }

    /// Apply a mutation under the lock, then persist and publish its events
    pub fn update_store<F, R>(&self, action: &str, updater: F) -> Result<R, String>
    where
        F: FnOnce(&mut TimerStore) -> (R, bool, Vec<TimerEvent>),
    {
        let mut store = self.store.lock()
            .map_err(|e| format!("Failed to lock timer store: {}", e))?;

        let (result, changed, events) = updater(&mut *store);
        if !changed {
            debug!("{}: nothing changed", action);
            return Ok(result);
        }

        let snapshot = Snapshot::new(store.timers().to_vec());
        // Take the write turn before letting the next mutation in, then do
        // the I/O without blocking readers of the store
        let persist_guard = self.persist_guard.lock()
            .map_err(|e| format!("Failed to lock persistence: {}", e))?;
        drop(store);

        self.write_snapshot(&snapshot);
        drop(persist_guard);

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        for event in events {
            if let Err(e) = self.event_tx.send(event) {
                warn!("Failed to publish timer event, dispatcher gone: {}", e);
            }
        }

        Ok(result)
    }

    fn write_snapshot(&self, snapshot: &Snapshot) {
        if let Err(e) = snapshot.write_to(self.storage.as_ref()) {
            error!("Failed to persist timers: {}", e);
        }
    }

    /// Write the current collection regardless of changes
    pub fn persist(&self) -> Result<(), String> {
        let store = self.store.lock()
            .map_err(|e| format!("Failed to lock timer store: {}", e))?;
        let snapshot = Snapshot::new(store.timers().to_vec());
        let _persist_guard = self.persist_guard.lock()
            .map_err(|e| format!("Failed to lock persistence: {}", e))?;
        drop(store);

        snapshot
            .write_to(self.storage.as_ref())
            .map_err(|e| format!("Failed to persist timers: {}", e))
    }

    pub fn add_timer(&self, spec: TimerSpec) -> Result<Timer, String> {
        let timer = self.update_store("add", |store| (store.add(spec), true, Vec::new()))?;
        info!("Added timer {} \"{}\" ({}s)", timer.id, timer.title, timer.duration);
        Ok(timer)
    }

    pub fn delete_timer(&self, id: Uuid) -> Result<bool, String> {
        let deleted = self.update_store("delete", |store| {
            let deleted = store.delete(id);
            (deleted, deleted, Vec::new())
        })?;
        if deleted {
            info!("Deleted timer {}", id);
        }
        Ok(deleted)
    }

    pub fn toggle_timer(&self, id: Uuid) -> Result<Option<Timer>, String> {
        let timer = self.update_store("toggle", |store| {
            let toggled = store.toggle(id);
            (store.get(id).cloned(), toggled, Vec::new())
        })?;
        if let Some(timer) = &timer {
            info!(
                "Timer {} {}",
                id,
                if timer.is_running { "started" } else { "paused" }
            );
        }
        Ok(timer)
    }

    /// Tick a single timer; returns the expiry event if this tick finished it
    pub fn tick_timer(&self, id: Uuid) -> Result<Option<TimerEvent>, String> {
        self.update_store("tick", |store| {
            let was_running = store.get(id).is_some_and(|t| t.is_running);
            let event = store.tick(id);
            (event.clone(), was_running, event.into_iter().collect())
        })
    }

    /// One pass of the ticking driver over every running timer
    pub fn tick_running(&self) -> Result<Vec<TimerEvent>, String> {
        self.update_store("tick", |store| {
            let running = store.running_count();
            let events = store.tick_running();
            (events.clone(), running > 0, events)
        })
    }

    pub fn restart_timer(&self, id: Uuid) -> Result<Option<Timer>, String> {
        let timer = self.update_store("restart", |store| {
            let restarted = store.restart(id);
            (store.get(id).cloned(), restarted, Vec::new())
        })?;
        if timer.is_some() {
            info!("Restarted timer {}", id);
        }
        Ok(timer)
    }

    pub fn edit_timer(&self, id: Uuid, updates: TimerUpdates) -> Result<Option<Timer>, String> {
        let timer = self.update_store("edit", |store| {
            let edited = store.edit(id, updates);
            (store.get(id).cloned(), edited, Vec::new())
        })?;
        if let Some(timer) = &timer {
            info!("Edited timer {} \"{}\" ({}s)", id, timer.title, timer.duration);
        }
        Ok(timer)
    }

    /// Run the form validator, routing any rejection to the notifier
    pub fn validate_form(&self, form: &TimerForm) -> bool {
        check_timer_form(form, self.notifier.as_ref())
    }

    /// Current collection in display order
    pub fn timers(&self) -> Result<Vec<Timer>, String> {
        self.store.lock()
            .map(|store| store.timers().to_vec())
            .map_err(|e| format!("Failed to lock timer store: {}", e))
    }

    pub fn get_timer(&self, id: Uuid) -> Result<Option<Timer>, String> {
        self.store.lock()
            .map(|store| store.get(id).cloned())
            .map_err(|e| format!("Failed to lock timer store: {}", e))
    }

    /// Hand out the expiry event stream. There is one consumer, so only the
    /// first call gets it. Events queue up until it is taken.
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<TimerEvent>> {
        self.event_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::mpsc as mpsc_std, thread, time::Duration};

    use crate::{
        error::StorageError,
        services::RecordingNotifier,
        storage::{MemoryStorage, ROOT_KEY},
    };

    struct FailingStorage;

    impl SnapshotStorage for FailingStorage {
        fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
    }

    /// Storage whose first save parks until the test releases it
    struct GatedStorage {
        inner: MemoryStorage,
        gate: Mutex<Option<(mpsc_std::Sender<()>, mpsc_std::Receiver<()>)>>,
    }

    impl GatedStorage {
        fn new() -> (Self, mpsc_std::Receiver<()>, mpsc_std::Sender<()>) {
            let (entered_tx, entered_rx) = mpsc_std::channel();
            let (release_tx, release_rx) = mpsc_std::channel();
            let storage = Self {
                inner: MemoryStorage::new(),
                gate: Mutex::new(Some((entered_tx, release_rx))),
            };
            (storage, entered_rx, release_tx)
        }
    }

    impl SnapshotStorage for GatedStorage {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let gate = self.gate.lock().unwrap().take();
            if let Some((entered, release)) = gate {
                entered.send(()).unwrap();
                release.recv().unwrap();
            }
            self.inner.save(key, value)
        }
    }

    fn state_with(storage: Arc<dyn SnapshotStorage>) -> (AppState, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let state = AppState::init(storage, notifier.clone(), 0, "127.0.0.1".into());
        (state, notifier)
    }

    #[test]
    fn every_mutation_writes_a_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let (state, _) = state_with(storage.clone());

        let id = state.add_timer(TimerSpec::new("Tea", None, 3)).unwrap().id;
        state.toggle_timer(id).unwrap();
        state.tick_running().unwrap();

        let saved = Snapshot::read_from(storage.as_ref()).unwrap();
        assert_eq!(saved.timers.len(), 1);
        assert_eq!(saved.timers[0].remaining_time, 2);
        assert!(saved.timers[0].is_running);
    }

    #[test]
    fn reload_resumes_running_timer_from_saved_remaining_time() {
        let storage = Arc::new(MemoryStorage::new());
        let (state, _) = state_with(storage.clone());
        let id = state.add_timer(TimerSpec::new("Tea", None, 5)).unwrap().id;
        state.toggle_timer(id).unwrap();
        state.tick_running().unwrap();
        drop(state);

        let (reloaded, _) = state_with(storage);
        let timer = reloaded.get_timer(id).unwrap().unwrap();
        assert_eq!(timer.remaining_time, 4);
        assert!(timer.is_running);

        reloaded.tick_running().unwrap();
        assert_eq!(reloaded.get_timer(id).unwrap().unwrap().remaining_time, 3);
    }

    #[test]
    fn storage_failure_keeps_in_memory_state() {
        let (state, _) = state_with(Arc::new(FailingStorage));

        let id = state.add_timer(TimerSpec::new("Tea", None, 3)).unwrap().id;
        state.toggle_timer(id).unwrap();
        assert!(state.get_timer(id).unwrap().unwrap().is_running);
        assert!(state.persist().is_err());
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(ROOT_KEY, "[[[").unwrap();

        let (state, _) = state_with(storage);
        assert!(state.timers().unwrap().is_empty());
    }

    #[test]
    fn expiry_is_published_once() {
        let (state, _) = state_with(Arc::new(MemoryStorage::new()));
        let mut rx = state.take_event_receiver().unwrap();
        assert!(state.take_event_receiver().is_none());

        let id = state.add_timer(TimerSpec::new("Tea", None, 2)).unwrap().id;
        state.toggle_timer(id).unwrap();
        for _ in 0..4 {
            state.tick_running().unwrap();
        }

        assert_eq!(
            rx.try_recv().unwrap(),
            TimerEvent::Expired { id, title: "Tea".into() }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tick_timer_only_reports_the_zero_crossing() {
        let (state, _) = state_with(Arc::new(MemoryStorage::new()));
        let id = state.add_timer(TimerSpec::new("Tea", None, 1)).unwrap().id;

        assert_eq!(state.tick_timer(id).unwrap(), None);
        state.toggle_timer(id).unwrap();
        assert!(state.tick_timer(id).unwrap().is_some());
        assert_eq!(state.tick_timer(id).unwrap(), None);
    }

    #[test]
    fn missing_ids_leave_last_action_untouched() {
        let (state, _) = state_with(Arc::new(MemoryStorage::new()));
        let ghost = Uuid::new_v4();

        assert!(!state.delete_timer(ghost).unwrap());
        assert!(state.toggle_timer(ghost).unwrap().is_none());
        assert!(state.restart_timer(ghost).unwrap().is_none());
        assert!(state.edit_timer(ghost, TimerUpdates::default()).unwrap().is_none());
        assert_eq!(state.get_last_action(), (None, None));
    }

    #[test]
    fn rejected_form_reaches_the_notifier() {
        let (state, notifier) = state_with(Arc::new(MemoryStorage::new()));

        assert!(!state.validate_form(&TimerForm::new("T", 0, 0, 0)));
        assert!(state.validate_form(&TimerForm::new("T", 0, 0, 5)));
        assert_eq!(notifier.validation_errors(), ["zero duration"]);
    }

    #[test]
    fn slow_save_is_not_overwritten_by_an_older_snapshot() {
        let (storage, entered, release) = GatedStorage::new();
        let storage = Arc::new(storage);
        let (state, _) = state_with(storage.clone());
        let state = Arc::new(state);

        let first = {
            let state = Arc::clone(&state);
            thread::spawn(move || state.add_timer(TimerSpec::new("A", None, 5)).unwrap())
        };
        entered.recv().unwrap();

        let second = {
            let state = Arc::clone(&state);
            thread::spawn(move || state.add_timer(TimerSpec::new("B", None, 5)).unwrap())
        };
        // Give the second writer time to queue up behind the stalled save
        thread::sleep(Duration::from_millis(50));
        release.send(()).unwrap();

        first.join().unwrap();
        second.join().unwrap();

        let saved = Snapshot::read_from(storage.as_ref()).unwrap();
        assert_eq!(saved.timers, state.timers().unwrap());
        assert_eq!(saved.timers.len(), 2);
    }
}
