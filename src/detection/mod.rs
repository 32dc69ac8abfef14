//! Person-detection event stream
//!
//! Client side of the detection service websocket:
//! - `DetectionClient`: connect, keep-alive, dispatch, reconnect on close
//! - `TriggerDebouncer`: at most one play-audio trigger per cooldown window
//! - `DetectionEvent` / `ClientMessage`: JSON wire messages

pub mod client;
pub mod debounce;
pub mod messages;

pub use client::{ConnectionState, DetectionClient, DetectionConfig, DetectionStatus, DetectionUpdate};
pub use debounce::{TriggerCooldown, TriggerDebouncer};
pub use messages::{ClientMessage, DetectionEvent};
