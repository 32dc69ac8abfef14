//! Session lifecycle primitives
//!
//! Building blocks shared by every long-running session in the crate:
//! - `SessionGuard`: at most one attempt in flight per controller
//! - `SessionState` / `Termination` / `RestartPolicy`: the lifecycle state
//!   machine and the restart decision taken when an attempt ends
//! - `ScheduledTask`: a cancellable one-shot timer owned by a controller

mod guard;
mod state;
mod timer;

pub use guard::SessionGuard;
pub use state::{RestartPolicy, SessionState, Termination};
pub use timer::ScheduledTask;
