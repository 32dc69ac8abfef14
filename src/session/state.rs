use serde::Serialize;
use std::time::Duration;

/// Lifecycle of one controlled resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    StoppingIntentional,
}

impl SessionState {
    /// True while an attempt is owned (anything but `Idle`)
    pub fn is_in_flight(self) -> bool {
        self != SessionState::Idle
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// How the previous attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The session was no longer wanted when the attempt ended
    Intentional,
    /// Transient end (natural end of utterance, no speech) while still wanted
    Recoverable,
    /// Persistent failure; restarting would only loop
    Fatal,
}

/// Restart decision computed from the terminal reason of the previous attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub should_restart: bool,
    pub delay: Duration,
}

impl RestartPolicy {
    pub fn never() -> Self {
        Self {
            should_restart: false,
            delay: Duration::ZERO,
        }
    }

    pub fn after(delay: Duration) -> Self {
        Self {
            should_restart: true,
            delay,
        }
    }

    /// Only recoverable terminations restart, after `restart_delay`.
    pub fn for_termination(termination: Termination, restart_delay: Duration) -> Self {
        match termination {
            Termination::Recoverable => Self::after(restart_delay),
            Termination::Intentional | Termination::Fatal => Self::never(),
        }
    }
}
