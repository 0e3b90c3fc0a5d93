use anyhow::{bail, Context, Result};
use std::io::Cursor;
use tracing::debug;

use super::backend::AudioFrame;

/// Ordered fragments collected during a capture session
///
/// Fragments are kept as delivered by the backend and only concatenated
/// when the session is finalized.
#[derive(Debug, Default)]
pub struct FragmentBuffer {
    fragments: Vec<AudioFrame>,
}

impl FragmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: AudioFrame) {
        if !frame.samples.is_empty() {
            self.fragments.push(frame);
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.fragments.iter().map(|f| f.samples.len()).sum()
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// Concatenate every fragment into a single in-memory WAV file
    ///
    /// `fallback_rate` is only used for the header of an empty recording.
    pub fn finish(&mut self, fallback_rate: u32) -> Result<EncodedWav> {
        let fragments = std::mem::take(&mut self.fragments);

        let sample_rate = fragments.first().map(|f| f.sample_rate).unwrap_or(fallback_rate);
        let channels = fragments.first().map(|f| f.channels).unwrap_or(1);

        if let Some(odd) = fragments
            .iter()
            .find(|f| f.sample_rate != sample_rate || f.channels != channels)
        {
            bail!(
                "Fragment format changed mid-session: {}Hz/{}ch, then {}Hz/{}ch",
                sample_rate,
                channels,
                odd.sample_rate,
                odd.channels
            );
        }

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut sample_count = 0usize;
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV writer")?;

            for frame in &fragments {
                for &sample in &frame.samples {
                    writer
                        .write_sample(sample)
                        .context("Failed to write sample to WAV")?;
                }
                sample_count += frame.samples.len();
            }

            writer.finalize().context("Failed to finalize WAV data")?;
        }

        debug!(
            "Encoded {} fragments ({} samples) at {}Hz",
            fragments.len(),
            sample_count,
            sample_rate
        );

        Ok(EncodedWav {
            bytes: cursor.into_inner(),
            sample_rate,
            channels,
            sample_count,
        })
    }
}

/// A finished WAV container and what went into it
#[derive(Debug, Clone)]
pub struct EncodedWav {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_count: usize,
}

impl EncodedWav {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        (self.sample_count as u64 / self.channels as u64) * 1000 / self.sample_rate as u64
    }
}
