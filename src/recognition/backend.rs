use serde::Serialize;
use tokio::sync::mpsc;

/// Events emitted by a recognizer over the lifetime of an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// The attempt is capturing audio
    Began,
    /// A recognition hypothesis; only final results are acted on
    Result { text: String, is_final: bool },
    /// The attempt finished (after a result, a timeout or a `stop()`)
    Ended,
    /// The attempt failed and is over
    Error(RecognizerErrorKind),
}

/// Platform error reported when an attempt fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerErrorKind {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl RecognizerErrorKind {
    /// Only `NoSpeech` is known to be transient. Anything else is treated
    /// as persistent so a broken recognizer cannot cause a restart storm.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RecognizerErrorKind::NoSpeech)
    }
}

/// Failures returned by `Recognizer::start` / `Recognizer::stop`
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("recognizer already started")]
    AlreadyStarted,
    #[error("recognizer already stopped")]
    AlreadyStopped,
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),
}

/// Streaming speech recognizer trait
///
/// Implementations report the progress of each attempt on the channel
/// handed out by `events()`. Every attempt that was started successfully
/// must eventually be followed by exactly one terminal event (`Ended` or
/// `Error`).
#[async_trait::async_trait]
pub trait Recognizer: Send + Sync {
    /// Begin one recognition attempt
    async fn start(&mut self) -> Result<(), RecognizerError>;

    /// Ask the current attempt to finish
    async fn stop(&mut self) -> Result<(), RecognizerError>;

    /// Take the event receiver. Returns `None` once it has been taken.
    fn events(&mut self) -> Option<mpsc::UnboundedReceiver<RecognizerEvent>>;

    /// Get recognizer name for logging
    fn name(&self) -> &str;
}
