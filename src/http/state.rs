use crate::detection::DetectionClient;
use crate::recognition::RecognitionController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub recognition: Arc<RecognitionController>,
    pub detection: Arc<DetectionClient>,
}

impl AppState {
    pub fn new(recognition: Arc<RecognitionController>, detection: Arc<DetectionClient>) -> Self {
        Self {
            recognition,
            detection,
        }
    }
}
