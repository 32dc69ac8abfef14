use crate::detection::DetectionConfig;
use crate::recognition::RecognitionConfig;
use anyhow::{ensure, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub detection: DetectionSettings,
    pub recognition: RecognitionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSettings {
    pub url: String,
    pub keepalive_secs: u64,
    pub reconnect_delay_secs: u64,
    pub trigger_cooldown_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionSettings {
    pub lang: String,
    pub restart_delay_ms: u64,
    /// Seconds the line recognizer waits for input before reporting no speech
    pub silence_timeout_secs: u64,
}

impl Config {
    /// Load built-in defaults, then `path` (optional), then `QUIZ_LINK_*`
    /// environment variables (`QUIZ_LINK_DETECTION__URL=...`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "quiz-link")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080_i64)?
            .set_default("detection.url", "ws://localhost:8000/ws")?
            .set_default("detection.keepalive_secs", 30_i64)?
            .set_default("detection.reconnect_delay_secs", 5_i64)?
            .set_default("detection.trigger_cooldown_ms", 1000_i64)?
            .set_default("recognition.lang", "ja-JP")?
            .set_default("recognition.restart_delay_ms", 300_i64)?
            .set_default("recognition.silence_timeout_secs", 8_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("QUIZ_LINK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Intervals of zero would panic the keep-alive timer or turn
    /// reconnects and restarts into busy loops
    fn validate(&self) -> Result<()> {
        ensure!(self.detection.keepalive_secs > 0, "detection.keepalive_secs must be positive");
        ensure!(
            self.detection.reconnect_delay_secs > 0,
            "detection.reconnect_delay_secs must be positive"
        );
        ensure!(
            self.recognition.restart_delay_ms > 0,
            "recognition.restart_delay_ms must be positive"
        );
        ensure!(
            self.recognition.silence_timeout_secs > 0,
            "recognition.silence_timeout_secs must be positive"
        );
        Ok(())
    }

    pub fn detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            url: self.detection.url.clone(),
            keepalive_interval: Duration::from_secs(self.detection.keepalive_secs),
            reconnect_delay: Duration::from_secs(self.detection.reconnect_delay_secs),
            trigger_cooldown: Duration::from_millis(self.detection.trigger_cooldown_ms),
        }
    }

    pub fn recognition_config(&self) -> RecognitionConfig {
        RecognitionConfig {
            restart_delay: Duration::from_millis(self.recognition.restart_delay_ms),
            lang: self.recognition.lang.clone(),
        }
    }

    pub fn silence_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition.silence_timeout_secs)
    }
}
