use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Cooldown window opened by the last trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerCooldown {
    pub active: bool,
    pub expires_at: Option<Instant>,
}

impl TriggerCooldown {
    /// Clear the window if it has expired; returns whether it is still active
    fn refresh(&mut self, now: Instant) -> bool {
        if self.active && self.expires_at.is_some_and(|at| now >= at) {
            self.active = false;
            self.expires_at = None;
        }
        self.active
    }
}

/// Suppresses repeat play-audio triggers within a cooldown window
pub struct TriggerDebouncer {
    cooldown: Duration,
    state: Mutex<TriggerCooldown>,
    on_fire: Box<dyn Fn() + Send + Sync>,
}

impl TriggerDebouncer {
    pub fn new<F>(cooldown: Duration, on_fire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            cooldown,
            state: Mutex::new(TriggerCooldown::default()),
            on_fire: Box::new(on_fire),
        }
    }

    /// Invoke the callback unless a cooldown is running.
    ///
    /// Returns whether the callback fired.
    pub fn fire(&self) -> bool {
        {
            let mut cooldown = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            if cooldown.refresh(now) {
                debug!("Play-audio trigger suppressed by cooldown");
                return false;
            }
            cooldown.active = true;
            cooldown.expires_at = Some(now + self.cooldown);
        }

        (self.on_fire)();
        true
    }
}
