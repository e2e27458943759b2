//! Ticking driver and notification dispatch, run on paused tokio time.

use std::{sync::Arc, time::Duration};

use multi_timer::{
    services::RecordingNotifier,
    state::{AppState, TimerSpec},
    storage::{MemoryStorage, Snapshot},
    tasks::{notification_dispatcher_task, ticking_driver_task},
};

const PERIOD: Duration = Duration::from_secs(1);

fn setup() -> (Arc<AppState>, Arc<RecordingNotifier>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let state = Arc::new(AppState::init(
        storage.clone(),
        notifier.clone(),
        0,
        "127.0.0.1".to_string(),
    ));
    (state, notifier, storage)
}

fn spawn_tasks(state: &Arc<AppState>) {
    tokio::spawn(notification_dispatcher_task(Arc::clone(state)));
    tokio::spawn(ticking_driver_task(Arc::clone(state), PERIOD));
}

#[tokio::test(start_paused = true)]
async fn two_second_timer_expires_after_two_ticks_and_notifies_once() {
    let (state, notifier, storage) = setup();
    let id = state.add_timer(TimerSpec::new("Eggs", None, 2)).unwrap().id;
    state.toggle_timer(id).unwrap();
    spawn_tasks(&state);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let timer = state.get_timer(id).unwrap().unwrap();
    assert_eq!(timer.remaining_time, 1);
    assert!(timer.is_running);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let timer = state.get_timer(id).unwrap().unwrap();
    assert_eq!(timer.remaining_time, 0);
    assert!(!timer.is_running);

    // Further passes change nothing and fire nothing
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(notifier.expired(), ["Eggs"]);

    let saved = Snapshot::read_from(storage.as_ref()).unwrap();
    assert_eq!(saved.timers[0].remaining_time, 0);
    assert!(!saved.timers[0].is_running);
}

#[tokio::test(start_paused = true)]
async fn timers_expiring_in_the_same_pass_each_notify() {
    let (state, notifier, _) = setup();
    let a = state.add_timer(TimerSpec::new("A", None, 1)).unwrap().id;
    let b = state.add_timer(TimerSpec::new("B", None, 1)).unwrap().id;
    let c = state.add_timer(TimerSpec::new("C", None, 10)).unwrap().id;
    state.toggle_timer(a).unwrap();
    state.toggle_timer(b).unwrap();
    spawn_tasks(&state);

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let mut expired = notifier.expired();
    expired.sort();
    assert_eq!(expired, ["A", "B"]);
    assert_eq!(state.get_timer(c).unwrap().unwrap().remaining_time, 10);
}

#[tokio::test(start_paused = true)]
async fn paused_timer_stops_receiving_ticks() {
    let (state, notifier, _) = setup();
    let id = state.add_timer(TimerSpec::new("Oven", None, 10)).unwrap().id;
    state.toggle_timer(id).unwrap();
    spawn_tasks(&state);

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    state.toggle_timer(id).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let timer = state.get_timer(id).unwrap().unwrap();
    assert_eq!(timer.remaining_time, 7);
    assert!(!timer.is_running);
    assert!(notifier.expired().is_empty());
}

#[tokio::test(start_paused = true)]
async fn restored_running_timer_resumes_without_catch_up() {
    let storage = Arc::new(MemoryStorage::new());
    {
        let notifier = Arc::new(RecordingNotifier::new());
        let state = AppState::init(storage.clone(), notifier, 0, "127.0.0.1".into());
        let id = state.add_timer(TimerSpec::new("Bread", None, 3)).unwrap().id;
        state.toggle_timer(id).unwrap();
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let state = Arc::new(AppState::init(storage, notifier.clone(), 0, "127.0.0.1".into()));
    let timer = state.timers().unwrap().remove(0);
    assert_eq!(timer.remaining_time, 3);
    assert!(timer.is_running);

    spawn_tasks(&state);
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(notifier.expired(), ["Bread"]);
}

#[tokio::test(start_paused = true)]
async fn a_crowded_tick_pass_notifies_every_expiry() {
    let (state, notifier, _) = setup();
    for i in 0..300 {
        let id = state.add_timer(TimerSpec::new(format!("T{}", i), None, 1)).unwrap().id;
        state.toggle_timer(id).unwrap();
    }
    spawn_tasks(&state);

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let expired = notifier.expired();
    assert_eq!(expired.len(), 300);
    assert!(state.timers().unwrap().iter().all(|t| t.is_expired() && !t.is_running));
}

#[tokio::test(start_paused = true)]
async fn expiries_before_the_dispatcher_starts_are_still_delivered() {
    let (state, notifier, _) = setup();
    let id = state.add_timer(TimerSpec::new("Early", None, 1)).unwrap().id;
    state.toggle_timer(id).unwrap();
    state.tick_running().unwrap();

    tokio::spawn(notification_dispatcher_task(Arc::clone(&state)));
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(notifier.expired(), ["Early"]);
}
