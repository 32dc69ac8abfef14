//! Continuous voice-command recognition
//!
//! This module keeps one logical recognition session alive over a streaming
//! recognizer that ends on its own (timeouts, no speech, platform errors):
//! - `Recognizer`: the primitive boundary (start/stop + event stream)
//! - `RecognitionController`: restart policy, pause/resume, intent delivery
//! - `classify`: maps recognized text to an `Intent`
//! - `LineRecognizer`: a text-line driven recognizer for terminals and tests

mod backend;
mod controller;
mod interpreter;
mod line;
mod status;

pub use backend::{Recognizer, RecognizerError, RecognizerErrorKind, RecognizerEvent};
pub use controller::{RecognitionConfig, RecognitionController};
pub use interpreter::{classify, Intent, Utterance};
pub use line::LineRecognizer;
pub use status::RecognitionStatus;
