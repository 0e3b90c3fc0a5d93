use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Capacity of the event channel between a backend and its consumer
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Duration of audio this frame holds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        frames * 1000 / self.sample_rate as u64
    }
}

/// Everything a running backend can report to its consumer
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A fragment of captured audio
    Frame(AudioFrame),
    /// The platform reported a stream-level failure
    StreamError(String),
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate (decimated to when the device rate is a multiple of it)
    pub target_sample_rate: u32,
    /// Frame size in milliseconds for sources that pace themselves
    pub buffer_duration_ms: u64,
    /// Input device name; `None` picks the system default
    pub device: Option<String>,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // what the classifier resamples to anyway
            buffer_duration_ms: 100,
            device: None,
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal input stream
/// - File: replays a WAV file at real-time pace (headless runs, tests)
///
/// `start` is the device-acquisition step: an error from it means access was
/// denied or no device is available. Once started, failures arrive in-band as
/// [`CaptureEvent::StreamError`].
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive capture events
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>>;

    /// Stop capturing audio and release the device stream
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend for the given source
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => {
                let backend = super::microphone::MicrophoneBackend::new(config);
                Ok(Box::new(backend))
            }

            AudioSource::File(path) => {
                let backend = super::file::FileBackend::new(path, config);
                Ok(Box::new(backend))
            }
        }
    }
}

/// Audio source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Live input device
    Microphone,
    /// WAV file replayed as if it were a device
    File(PathBuf),
}
