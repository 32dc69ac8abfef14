use super::backend::RecognizerErrorKind;
use crate::session::SessionState;
use serde::Serialize;

/// Display prompt shown after a final result that is neither answer
pub const PROMPT_TEXT: &str = "「まる」または「ばつ」と言ってください";

/// Display text shown after a fatal recognizer error
pub const FAILURE_TEXT: &str = "認識できませんでした";

/// Observable state of a recognition controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionStatus {
    /// Lifecycle state of the current attempt
    pub state: SessionState,

    /// Whether the controller wants voice input on (start requested, not stopped)
    pub listening: bool,

    /// Last recognized text, or a prompt/failure message for display
    pub recognized_text: String,

    /// Last fatal error; cleared by the next `start()`
    pub last_error: Option<RecognizerErrorKind>,

    /// Automatic restarts performed since the controller was created
    pub restarts: u64,
}

impl Default for RecognitionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            listening: false,
            recognized_text: String::new(),
            last_error: None,
            restarts: 0,
        }
    }
}
