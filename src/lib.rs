pub mod config;
pub mod detection;
pub mod http;
pub mod recognition;
pub mod session;

pub use config::Config;
pub use detection::{
    ConnectionState, DetectionClient, DetectionConfig, DetectionEvent, DetectionStatus,
    DetectionUpdate, TriggerDebouncer,
};
pub use http::{create_router, AppState};
pub use recognition::{
    classify, Intent, LineRecognizer, RecognitionConfig, RecognitionController,
    RecognitionStatus, Recognizer, RecognizerError, RecognizerErrorKind, RecognizerEvent,
};
pub use session::{RestartPolicy, ScheduledTask, SessionGuard, SessionState, Termination};
