use std::io::Cursor;
use std::time::Duration;

use crate::audio::EncodedWav;
use crate::error::{Error, Result};

/// File name the recording is uploaded under
pub const ARTIFACT_FILE_NAME: &str = "recording.wav";

/// Content type of the recording container
pub const ARTIFACT_MIME_TYPE: &str = "audio/wav";

/// The finished recording of one capture session
///
/// Immutable once produced; handed by value to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    bytes: Vec<u8>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
}

impl AudioArtifact {
    pub(crate) fn from_encoded(wav: EncodedWav) -> Self {
        let duration = Duration::from_millis(wav.duration_ms());
        Self {
            bytes: wav.bytes,
            sample_rate: wav.sample_rate,
            channels: wav.channels,
            duration,
        }
    }

    /// Wrap an existing WAV file, validating its header
    pub fn from_wav_bytes(bytes: Vec<u8>) -> Result<Self> {
        let reader = hound::WavReader::new(Cursor::new(&bytes)).map_err(|e| Error::Encoding {
            message: format!("not a WAV container: {}", e),
        })?;

        let spec = reader.spec();
        let duration = if spec.sample_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(reader.duration() as u64 * 1000 / spec.sample_rate as u64)
        };
        drop(reader);

        Ok(Self {
            bytes,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            duration,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Length of the recorded audio
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn file_name(&self) -> &'static str {
        ARTIFACT_FILE_NAME
    }

    pub fn mime_type(&self) -> &'static str {
        ARTIFACT_MIME_TYPE
    }
}
