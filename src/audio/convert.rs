//! Sample format and layout conversion for captured frames.

use super::backend::AudioFrame;

/// Convert a float sample in [-1, 1] to 16-bit PCM
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Convert an unsigned 16-bit sample (offset binary) to signed PCM
pub fn u16_to_i16(sample: u16) -> i16 {
    (sample as i32 - 32768) as i16
}

/// Bring a frame to mono at (or as close as possible to) `target_rate`
pub fn normalize_frame(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    let frame = to_mono(frame);
    downsample(frame, target_rate)
}

/// Average interleaved channels down to one
pub fn to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels <= 1 {
        return frame;
    }

    let channels = frame.channels as usize;
    let mono_samples: Vec<i16> = frame
        .samples
        .chunks_exact(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect();

    AudioFrame {
        samples: mono_samples,
        sample_rate: frame.sample_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Decimate by an integer ratio.
///
/// Only applies when the frame rate is an exact multiple of `target_rate`;
/// otherwise the frame keeps its native rate so the reported rate stays true.
pub fn downsample(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    if target_rate == 0 || frame.sample_rate <= target_rate || frame.sample_rate % target_rate != 0 {
        return frame;
    }

    let ratio = (frame.sample_rate / target_rate) as usize;
    let channels = frame.channels.max(1) as usize;

    let downsampled: Vec<i16> = frame
        .samples
        .chunks_exact(channels)
        .step_by(ratio)
        .flatten()
        .copied()
        .collect();

    AudioFrame {
        samples: downsampled,
        sample_rate: target_rate,
        channels: frame.channels,
        timestamp_ms: frame.timestamp_ms,
    }
}
