use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::audio::AudioBackendConfig;
use crate::capture::CaptureConfig;

/// Prefix for environment overrides, e.g. `VOICEMOOD__API__BASE_URL`
pub const ENV_PREFIX: &str = "VOICEMOOD";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub capture: CaptureSettings,
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
pub struct ApiConfig {
    /// Origin serving both `/predict` and `/playlist/{emotion}`
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureSettings {
    pub max_duration_ms: u64,
    pub tick_ms: u64,
    pub sampler_interval_ms: u64,
    pub fft_size: usize,
    pub target_sample_rate: u32,
    #[serde(default)]
    pub device: Option<String>,
}

impl Config {
    /// Load defaults, then `path` (optional, any format the extension names),
    /// then `VOICEMOOD__*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "voicemood")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3000)?
            .set_default("api.base_url", "http://localhost:8000")?
            .set_default("capture.max_duration_ms", 3000)?
            .set_default("capture.tick_ms", 100)?
            .set_default("capture.sampler_interval_ms", 16)?
            .set_default("capture.fft_size", 256)?
            .set_default("capture.target_sample_rate", 16000)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            max_duration: Duration::from_millis(self.capture.max_duration_ms),
            tick: Duration::from_millis(self.capture.tick_ms),
            sampler_interval: Duration::from_millis(self.capture.sampler_interval_ms),
            fft_size: self.capture.fft_size,
            fallback_sample_rate: self.capture.target_sample_rate,
        }
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.capture.target_sample_rate,
            device: self.capture.device.clone(),
            ..AudioBackendConfig::default()
        }
    }
}
