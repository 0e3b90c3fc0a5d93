// Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use voicemood::audio::backend::EVENT_CHANNEL_CAPACITY;
use voicemood::{
    AudioArtifact, AudioBackend, AudioFrame, CaptureEvent, InferenceService, Playlist,
    PlaylistResponse,
};

/// Observes and drives a [`MockBackend`] from the test body
#[derive(Clone, Default)]
pub struct BackendProbe {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    sender: Arc<Mutex<Option<mpsc::Sender<CaptureEvent>>>>,
}

impl BackendProbe {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// True while the backend holds an open stream
    pub fn is_open(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }

    pub fn send_frame(&self, frame: AudioFrame) {
        if let Some(tx) = self.sender.lock().unwrap().as_ref() {
            tx.try_send(CaptureEvent::Frame(frame)).unwrap();
        }
    }

    pub fn fail(&self, message: &str) {
        if let Some(tx) = self.sender.lock().unwrap().as_ref() {
            tx.try_send(CaptureEvent::StreamError(message.to_string()))
                .unwrap();
        }
    }
}

/// In-memory audio backend that counts device acquisitions and releases
pub struct MockBackend {
    probe: BackendProbe,
    deny: bool,
    frames: Vec<AudioFrame>,
}

impl MockBackend {
    pub fn new() -> (Self, BackendProbe) {
        let probe = BackendProbe::default();
        (
            Self {
                probe: probe.clone(),
                deny: false,
                frames: Vec::new(),
            },
            probe,
        )
    }

    /// Refuse every `start`, like a denied permission prompt
    pub fn denied() -> (Self, BackendProbe) {
        let (mut backend, probe) = Self::new();
        backend.deny = true;
        (backend, probe)
    }

    /// Deliver `frames` as soon as capture starts
    pub fn with_frames(mut self, frames: Vec<AudioFrame>) -> Self {
        self.frames = frames;
        self
    }
}

#[async_trait::async_trait]
impl AudioBackend for MockBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);

        if self.deny {
            bail!("Permission denied");
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        for frame in &self.frames {
            tx.try_send(CaptureEvent::Frame(frame.clone()))?;
        }
        *self.probe.sender.lock().unwrap() = Some(tx);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.probe.sender.lock().unwrap().take();
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.probe.is_open()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 100ms of a 440Hz tone at 16kHz mono
pub fn tone_frame(timestamp_ms: u64) -> AudioFrame {
    let samples = (0..1600)
        .map(|i| {
            let t = i as f32 / 16000.0;
            ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 12000.0) as i16
        })
        .collect();

    AudioFrame {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

/// Write a mono 16-bit WAV of `seconds` of a 440Hz tone
pub fn write_tone_wav(path: &Path, sample_rate: u32, seconds: f32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total = (sample_rate as f32 * seconds) as usize;
    for i in 0..total {
        let t = i as f32 / sample_rate as f32;
        writer.write_sample(((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 8000.0) as i16)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Inference service that always answers with the same emotion
pub struct StaticService {
    pub emotion: String,
}

impl StaticService {
    pub fn new(emotion: &str) -> Arc<Self> {
        Arc::new(Self {
            emotion: emotion.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl InferenceService for StaticService {
    async fn predict_emotion(&self, _artifact: AudioArtifact) -> voicemood::Result<String> {
        Ok(self.emotion.clone())
    }

    async fn fetch_playlist(&self, emotion: &str) -> voicemood::Result<PlaylistResponse> {
        Ok(PlaylistResponse {
            emotion: emotion.to_string(),
            playlist: Playlist {
                name: format!("{} mix", emotion),
                description: None,
                cover_image: None,
                url: format!("https://open.spotify.com/playlist/{}", emotion),
                tracks: Vec::new(),
            },
        })
    }
}
