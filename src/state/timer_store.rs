//! Ordered timer collection and its state transitions
//!
//! Every operation here is pure with respect to the outside world: no I/O,
//! no logging side channels that matter for correctness. Operations on an
//! unknown id are silent no-ops and report `false`/`None`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timer::{Timer, TimerEvent, TimerSpec, TimerUpdates};

/// Insertion-ordered collection of timers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStore {
    timers: Vec<Timer>,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from a persisted collection, repairing any record whose
    /// remaining time exceeds its duration.
    pub fn from_timers(mut timers: Vec<Timer>) -> Self {
        for timer in &mut timers {
            if timer.remaining_time > timer.duration {
                timer.remaining_time = timer.duration;
            }
            if timer.remaining_time == 0 {
                timer.is_running = false;
            }
        }
        Self { timers }
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn into_timers(self) -> Vec<Timer> {
        self.timers
    }

    pub fn get(&self, id: Uuid) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.timers.iter().filter(|t| t.is_running).count()
    }

    /// Append a new timer and return a copy of it
    pub fn add(&mut self, spec: TimerSpec) -> Timer {
        let timer = Timer::from_spec(spec);
        self.timers.push(timer.clone());
        timer
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Flip the running flag. A timer at zero is not guarded here.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        match self.get_mut(id) {
            Some(timer) => {
                timer.is_running = !timer.is_running;
                true
            }
            None => false,
        }
    }

    /// Advance one running timer by a second.
    ///
    /// Returns `Expired` only on the tick that moves the timer from 1 to 0.
    /// A timer that was toggled on while already at 0 is stopped silently.
    pub fn tick(&mut self, id: Uuid) -> Option<TimerEvent> {
        let timer = self.get_mut(id)?;
        if !timer.is_running {
            return None;
        }

        if timer.remaining_time == 0 {
            timer.is_running = false;
            return None;
        }

        timer.remaining_time -= 1;
        if timer.remaining_time > 0 {
            return None;
        }

        timer.is_running = false;
        Some(TimerEvent::Expired {
            id: timer.id,
            title: timer.title.clone(),
        })
    }

    /// One pass over every running timer. Returns the expiries of this pass.
    pub fn tick_running(&mut self) -> Vec<TimerEvent> {
        let running: Vec<Uuid> = self
            .timers
            .iter()
            .filter(|t| t.is_running)
            .map(|t| t.id)
            .collect();

        running.into_iter().filter_map(|id| self.tick(id)).collect()
    }

    pub fn restart(&mut self, id: Uuid) -> bool {
        match self.get_mut(id) {
            Some(timer) => {
                timer.reset();
                true
            }
            None => false,
        }
    }

    /// Merge updates, then reset progress to the resulting duration and pause
    pub fn edit(&mut self, id: Uuid, updates: TimerUpdates) -> bool {
        let Some(timer) = self.get_mut(id) else {
            return false;
        };

        if let Some(title) = updates.title {
            timer.title = title;
        }
        if let Some(description) = updates.description {
            timer.description = description;
        }
        if let Some(duration) = updates.duration {
            timer.duration = duration;
        }
        timer.reset();
        true
    }
}
