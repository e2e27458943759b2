//! Dismissable alerts with optional looping sound

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{
    process::Command,
    task::JoinHandle,
    time::{sleep, Instant},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notifier::NotificationSink;
use crate::error::NotifyError;

/// How long an alert message stays up when nothing keeps it alive
pub const DEFAULT_ALERT_TTL: Duration = Duration::from_secs(5);

/// How the expiry sound is played
#[derive(Debug, Clone)]
pub struct SoundConfig {
    /// Player executable, e.g. `paplay`
    pub player: String,
    /// Sound file handed to the player as its only argument
    pub file: PathBuf,
    /// Gap between repetitions
    pub pause: Duration,
}

impl SoundConfig {
    pub fn new(player: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            player: player.into(),
            file: file.into(),
            pause: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Expired,
    ValidationError,
}

/// A message waiting for the user to dismiss it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug)]
struct AlertEntry {
    alert: Alert,
    raised: Instant,
    playback: Option<JoinHandle<()>>,
}

impl AlertEntry {
    fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

/// Active alerts in the order they were raised.
///
/// An alert disappears after its TTL unless its sound is still looping; a
/// playing expiry alert stays until dismissed so the sound can be stopped.
#[derive(Debug)]
pub struct AlertBoard {
    entries: Mutex<Vec<AlertEntry>>,
    ttl: Duration,
}

impl Default for AlertBoard {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_ALERT_TTL)
    }
}

impl AlertBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            ttl,
        }
    }

    fn prune_locked(entries: &mut Vec<AlertEntry>, ttl: Duration) {
        let before = entries.len();
        entries.retain(|e| e.raised.elapsed() < ttl || e.is_playing());
        if entries.len() != before {
            debug!("Expired {} alert(s)", before - entries.len());
        }
    }

    fn raise(
        &self,
        kind: AlertKind,
        message: String,
        playback: Option<JoinHandle<()>>,
    ) -> Result<Alert, NotifyError> {
        let alert = Alert {
            id: Uuid::new_v4(),
            kind,
            message,
            raised_at: Utc::now(),
        };

        let mut entries = self.entries.lock()
            .map_err(|e| NotifyError::Board(e.to_string()))?;
        Self::prune_locked(&mut entries, self.ttl);
        entries.push(AlertEntry {
            alert: alert.clone(),
            raised: Instant::now(),
            playback,
        });
        Ok(alert)
    }

    pub fn list(&self) -> Vec<Alert> {
        match self.entries.lock() {
            Ok(mut entries) => {
                Self::prune_locked(&mut entries, self.ttl);
                entries.iter().map(|e| e.alert.clone()).collect()
            }
            Err(e) => {
                warn!("Failed to lock alert board: {}", e);
                Vec::new()
            }
        }
    }

    /// Whether the alert still has a live playback task
    pub fn is_playing(&self, id: Uuid) -> bool {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|e| e.alert.id == id)
                    .map(AlertEntry::is_playing)
            })
            .unwrap_or(false)
    }

    /// Remove an alert and stop its sound. Returns false for unknown ids.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to lock alert board: {}", e);
                return false;
            }
        };

        let Some(index) = entries.iter().position(|e| e.alert.id == id) else {
            return false;
        };

        let entry = entries.remove(index);
        if let Some(handle) = entry.playback {
            handle.abort();
            debug!("Stopped alert sound for {}", id);
        }
        info!("Dismissed alert: {}", entry.alert.message);
        true
    }
}

impl Drop for AlertBoard {
    fn drop(&mut self) {
        if let Ok(entries) = self.entries.get_mut() {
            for handle in entries.iter().filter_map(|e| e.playback.as_ref()) {
                handle.abort();
            }
        }
    }
}

/// Sink that raises alerts on an [`AlertBoard`] and loops a sound on expiry
#[derive(Debug, Clone)]
pub struct AlertNotifier {
    board: Arc<AlertBoard>,
    sound: Option<SoundConfig>,
}

impl AlertNotifier {
    pub fn new(board: Arc<AlertBoard>, sound: Option<SoundConfig>) -> Self {
        Self { board, sound }
    }

    pub fn board(&self) -> &Arc<AlertBoard> {
        &self.board
    }

    /// Start the looping sound, if one is configured. Failures are logged
    /// here; the alert is raised either way.
    fn start_playback(&self) -> Option<JoinHandle<()>> {
        let sound = self.sound.clone()?;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(play_until_dismissed(sound))),
            Err(e) => {
                warn!("Cannot play {}: no async runtime: {}", sound.file.display(), e);
                None
            }
        }
    }
}

impl NotificationSink for AlertNotifier {
    fn notify_expired(&self, title: &str) -> Result<(), NotifyError> {
        let message = format!("Timer \"{}\" has ended!", title);

        let playback = self.start_playback();
        let alert = self.board.raise(AlertKind::Expired, message, playback)?;
        info!("Alert raised: {}", alert.message);
        Ok(())
    }

    fn notify_validation_error(&self, message: &str) -> Result<(), NotifyError> {
        let alert = self.board.raise(AlertKind::ValidationError, message.to_string(), None)?;
        debug!("Validation alert raised: {}", alert.message);
        Ok(())
    }
}

/// Replay the sound until the task is aborted. Aborting drops the running
/// child, which kills the player process.
async fn play_until_dismissed(sound: SoundConfig) {
    loop {
        let status = Command::new(&sound.player)
            .arg(&sound.file)
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                warn!("Sound player {} exited with {}", sound.player, status);
                break;
            }
            Err(e) => {
                warn!("Failed to run sound player {}: {}", sound.player, e);
                break;
            }
        }

        sleep(sound.pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_raises_a_dismissable_alert() {
        let board = Arc::new(AlertBoard::new());
        let notifier = AlertNotifier::new(Arc::clone(&board), None);

        notifier.notify_expired("Tea").unwrap();
        let alerts = board.list();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Expired);
        assert_eq!(alerts[0].message, "Timer \"Tea\" has ended!");

        assert!(board.dismiss(alerts[0].id));
        assert!(board.list().is_empty());
        assert!(!board.dismiss(alerts[0].id));
    }

    #[test]
    fn validation_message_is_verbatim() {
        let board = Arc::new(AlertBoard::new());
        let notifier = AlertNotifier::new(Arc::clone(&board), None);

        notifier.notify_validation_error("zero duration").unwrap();
        let alerts = board.list();
        assert_eq!(alerts[0].kind, AlertKind::ValidationError);
        assert_eq!(alerts[0].message, "zero duration");
    }

    #[test]
    fn alert_survives_missing_runtime() {
        let board = Arc::new(AlertBoard::new());
        let notifier = AlertNotifier::new(
            Arc::clone(&board),
            Some(SoundConfig::new("paplay", "/nonexistent.oga")),
        );

        notifier.notify_expired("Tea").unwrap();
        let alerts = board.list();
        assert_eq!(alerts.len(), 1);
        assert!(!board.is_playing(alerts[0].id));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dismiss_stops_looping_sound() {
        let board = Arc::new(AlertBoard::new());
        // `sleep 30` stands in for a long-playing sound file
        let notifier = AlertNotifier::new(Arc::clone(&board), Some(SoundConfig::new("sleep", "30")));

        notifier.notify_expired("Tea").unwrap();
        let id = board.list()[0].id;
        assert!(board.is_playing(id));

        assert!(board.dismiss(id));
        assert!(!board.is_playing(id));
        assert!(board.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_alerts_expire_after_ttl() {
        let board = Arc::new(AlertBoard::with_ttl(Duration::from_secs(5)));
        let notifier = AlertNotifier::new(Arc::clone(&board), None);

        notifier.notify_validation_error("zero duration").unwrap();
        notifier.notify_expired("Tea").unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(board.list().len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(board.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_rejections_do_not_pile_up() {
        let board = Arc::new(AlertBoard::with_ttl(Duration::from_secs(5)));
        let notifier = AlertNotifier::new(Arc::clone(&board), None);

        for _ in 0..10 {
            notifier.notify_validation_error("title required").unwrap();
            tokio::time::advance(Duration::from_secs(2)).await;
        }
        // Only those raised within the last five seconds remain
        assert_eq!(board.list().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn playing_alert_outlives_ttl_until_dismissed() {
        let board = Arc::new(AlertBoard::with_ttl(Duration::from_secs(5)));
        let notifier = AlertNotifier::new(Arc::clone(&board), Some(SoundConfig::new("sleep", "30")));

        notifier.notify_expired("Tea").unwrap();
        let id = board.list()[0].id;

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(board.list().len(), 1);
        assert!(board.is_playing(id));

        assert!(board.dismiss(id));
        assert!(board.list().is_empty());
    }
}
