//! Live microphone capture using CPAL (Cross-Platform Audio Library).

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame, CaptureEvent, EVENT_CHANNEL_CAPACITY};
use super::convert;

/// List the names of all available audio input devices
pub fn list_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("Failed to enumerate input devices")?;

    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

fn find_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match name {
        Some(name) => {
            let mut devices = host
                .input_devices()
                .context("Failed to enumerate input devices")?;
            devices
                .find(|device| device.name().map(|n| n == name).unwrap_or(false))
                .with_context(|| format!("Audio device not found: {}", name))
        }
        None => host
            .default_input_device()
            .context("No default input device available"),
    }
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched through the Mutex in MicrophoneBackend,
/// and only to be dropped; it never crosses threads while in use.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone backend
///
/// Opens the input device at its native configuration and converts every
/// callback buffer to mono i16, decimated toward the target rate.
pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    stream: Mutex<Option<SendableStream>>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            stream: Mutex::new(None),
        }
    }
}

fn build_stream<T, F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: mpsc::Sender<CaptureEvent>,
    target_rate: u32,
    to_i16: F,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    F: Fn(T) -> i16 + Send + 'static,
{
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;
    let samples_per_second = (sample_rate as u64 * channels as u64).max(1);
    let mut samples_seen: u64 = 0;
    let data_tx = tx.clone();

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let frame = AudioFrame {
                    samples: data.iter().map(|&s| to_i16(s)).collect(),
                    sample_rate,
                    channels,
                    timestamp_ms: samples_seen * 1000 / samples_per_second,
                };
                samples_seen += data.len() as u64;

                let frame = convert::normalize_frame(frame, target_rate);
                if data_tx.try_send(CaptureEvent::Frame(frame)).is_err() {
                    debug!("Capture channel full or closed, dropping buffer");
                }
            },
            move |err: cpal::StreamError| {
                error!("Audio stream error: {}", err);
                let _ = tx.try_send(CaptureEvent::StreamError(err.to_string()));
            },
            None,
        )
        .context("Failed to build input stream")?;

    Ok(stream)
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>> {
        if self.is_capturing() {
            bail!("Already capturing");
        }

        let device = find_device(self.config.device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .default_input_config()
            .context("Failed to query default input config")?;
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();

        info!(
            "Opening input device '{}' ({}ch/{}Hz/{:?})",
            device_name, stream_config.channels, stream_config.sample_rate.0, sample_format
        );

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let target_rate = self.config.target_sample_rate;

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32, _>(&device, &stream_config, tx, target_rate, convert::f32_to_i16)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16, _>(&device, &stream_config, tx, target_rate, |s| s)?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16, _>(&device, &stream_config, tx, target_rate, convert::u16_to_i16)?
            }
            other => bail!("Unsupported sample format: {:?}", other),
        };

        stream.play().context("Failed to start input stream")?;

        let mut slot = match self.stream.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(SendableStream(stream));
        drop(slot);

        info!("Microphone capture started");

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let stream = match self.stream.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(stream) = stream {
            if let Err(e) = stream.0.pause() {
                debug!("Pausing input stream before release failed: {}", e);
            }
            drop(stream);
            info!("Microphone capture stopped");
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.stream.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}
