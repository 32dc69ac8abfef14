// Tests for layered configuration loading

use anyhow::Result;
use quiz_link::Config;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults_without_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let missing = temp_dir.path().join("missing");

    let cfg = Config::load(missing.to_str().unwrap())?;

    assert_eq!(cfg.service.name, "quiz-link");
    assert_eq!(cfg.service.http.port, 8080);
    assert_eq!(cfg.detection.url, "ws://localhost:8000/ws");

    let detection = cfg.detection_config();
    assert_eq!(detection.keepalive_interval, Duration::from_secs(30));
    assert_eq!(detection.reconnect_delay, Duration::from_secs(5));
    assert_eq!(detection.trigger_cooldown, Duration::from_millis(1000));

    let recognition = cfg.recognition_config();
    assert_eq!(recognition.restart_delay, Duration::from_millis(300));
    assert_eq!(recognition.lang, "ja-JP");
    assert_eq!(cfg.silence_timeout(), Duration::from_secs(8));

    Ok(())
}

#[test]
fn test_file_overrides_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("quiz-link.toml");
    fs::write(
        &path,
        r#"
[service.http]
port = 9090

[detection]
url = "ws://camera.local:8000/ws"
reconnect_delay_secs = 2

[recognition]
restart_delay_ms = 500
"#,
    )?;

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.service.http.port, 9090);
    assert_eq!(cfg.service.http.bind, "127.0.0.1");
    assert_eq!(cfg.detection.url, "ws://camera.local:8000/ws");
    assert_eq!(cfg.detection_config().reconnect_delay, Duration::from_secs(2));
    assert_eq!(cfg.detection_config().keepalive_interval, Duration::from_secs(30));
    assert_eq!(cfg.recognition_config().restart_delay, Duration::from_millis(500));

    Ok(())
}

#[test]
fn test_shipped_config_loads() -> Result<()> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/quiz-link.toml");
    let cfg = Config::load(path)?;

    assert_eq!(cfg.detection.url, "ws://localhost:8000/ws");
    assert_eq!(cfg.detection.trigger_cooldown_ms, 1000);

    Ok(())
}

#[test]
fn test_zero_intervals_are_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;

    for (section, key) in [
        ("detection", "keepalive_secs"),
        ("detection", "reconnect_delay_secs"),
        ("recognition", "restart_delay_ms"),
        ("recognition", "silence_timeout_secs"),
    ] {
        let path = temp_dir.path().join(format!("{}.toml", key));
        fs::write(&path, format!("[{}]\n{} = 0\n", section, key))?;

        let err = Config::load(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains(key), "unexpected error: {}", err);
    }

    Ok(())
}
