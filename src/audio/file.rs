use anyhow::{bail, Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame, CaptureEvent, EVENT_CHANNEL_CAPACITY};
use super::convert;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            bail!(
                "Unsupported WAV format: {:?} {}-bit (expected 16-bit PCM)",
                spec.sample_format,
                spec.bits_per_sample
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split into fixed-duration mono frames at (or near) `target_rate`
    pub fn into_frames(self, frame_ms: u64, target_rate: u32) -> Vec<AudioFrame> {
        let channels = self.channels.max(1) as usize;
        let frames_per_chunk = ((self.sample_rate as u64 * frame_ms.max(1)) / 1000).max(1) as usize;

        self.samples
            .chunks(frames_per_chunk * channels)
            .enumerate()
            .map(|(index, chunk)| {
                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: self.sample_rate,
                    channels: self.channels,
                    timestamp_ms: index as u64 * frame_ms,
                };
                convert::normalize_frame(frame, target_rate)
            })
            .collect()
    }
}

/// Replays a WAV file at real-time pace as if it were a live device
///
/// Once the file is exhausted the stream stays open and silent until
/// `stop` is called, just like a microphone nobody is talking into.
pub struct FileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
    task: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>, config: AudioBackendConfig) -> Self {
        Self {
            path: path.into(),
            config,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }

        let audio = AudioFile::open(&self.path)
            .with_context(|| format!("Audio source unavailable: {}", self.path.display()))?;
        let frame_ms = self.config.buffer_duration_ms.max(1);
        let frames = audio.into_frames(frame_ms, self.config.target_sample_rate);

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));

            for frame in frames {
                ticker.tick().await;
                debug!("Replaying frame at {}ms", frame.timestamp_ms);
                if tx.send(CaptureEvent::Frame(frame)).await.is_err() {
                    return;
                }
            }

            // Keep the stream open until the consumer goes away
            tx.closed().await;
        });

        self.task = Some(task);
        info!("File capture started: {}", self.path.display());

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("File capture stopped: {}", self.path.display());
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
