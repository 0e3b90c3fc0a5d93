// Tests for layered configuration loading

use anyhow::Result;
use std::time::Duration;
use tempfile::TempDir;
use voicemood::Config;

#[test]
fn test_defaults_without_file() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = Config::load(dir.path().join("missing").to_str().unwrap())?;

    assert_eq!(cfg.service.name, "voicemood");
    assert_eq!(cfg.service.http.port, 3000);
    assert_eq!(cfg.api.base_url, "http://localhost:8000");
    assert_eq!(cfg.capture.device, None);

    let capture = cfg.capture_config();
    assert_eq!(capture.max_duration, Duration::from_secs(3));
    assert_eq!(capture.tick, Duration::from_millis(100));
    assert_eq!(capture.fft_size, 256);

    Ok(())
}

#[test]
fn test_file_overrides_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("voicemood.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "http://inference.local:9000"

[capture]
max_duration_ms = 5000
device = "USB Mic"
"#,
    )?;

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.api.base_url, "http://inference.local:9000");
    assert_eq!(cfg.capture_config().max_duration, Duration::from_secs(5));
    assert_eq!(cfg.capture.tick_ms, 100);
    assert_eq!(cfg.backend_config().device.as_deref(), Some("USB Mic"));

    Ok(())
}

#[test]
fn test_bundled_config_loads() -> Result<()> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/voicemood.toml");
    let cfg = Config::load(path)?;

    assert_eq!(cfg.capture.max_duration_ms, 3000);
    assert_eq!(cfg.capture.target_sample_rate, 16000);

    Ok(())
}
