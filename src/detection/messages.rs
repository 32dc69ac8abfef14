use serde::{Deserialize, Serialize};

/// Message received from the detection service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectionEvent {
    /// A person entered the camera view
    PersonDetected { count: u32 },
    /// A person stayed long enough; play the quiz audio
    #[serde(rename = "play_audio")]
    PlayAudioTrigger,
    /// Any other `type` (including `pong`)
    #[serde(other)]
    Unknown,
}

impl DetectionEvent {
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Message sent to the detection service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

impl ClientMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
