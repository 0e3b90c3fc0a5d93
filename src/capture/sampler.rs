use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::audio::Analyser;

/// Number of bars in a visualizer frame
pub const VISUALIZER_BARS: usize = 20;

/// Normalized amplitudes, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualizerFrame([f32; VISUALIZER_BARS]);

impl VisualizerFrame {
    pub fn silent() -> Self {
        Self([0.0; VISUALIZER_BARS])
    }

    /// Fixed-stride pick of `VISUALIZER_BARS` bins: bar `i` reads bin `i * floor(len / N)`
    pub fn from_frequency_data(data: &[u8]) -> Self {
        let step = data.len() / VISUALIZER_BARS;
        let mut bars = [0.0; VISUALIZER_BARS];

        for (i, bar) in bars.iter_mut().enumerate() {
            if let Some(&value) = data.get(i * step) {
                *bar = value as f32 / u8::MAX as f32;
            }
        }

        Self(bars)
    }

    pub fn values(&self) -> &[f32; VISUALIZER_BARS] {
        &self.0
    }
}

impl Default for VisualizerFrame {
    fn default() -> Self {
        Self::silent()
    }
}

/// Reads the analysis graph and turns its snapshot into a visualizer frame
pub struct FrequencySampler {
    analyser: Arc<Mutex<Analyser>>,
}

impl FrequencySampler {
    pub fn new(analyser: Arc<Mutex<Analyser>>) -> Self {
        Self { analyser }
    }

    pub fn sample(&self) -> VisualizerFrame {
        let data = match self.analyser.lock() {
            Ok(mut analyser) => analyser.byte_frequency_data(),
            Err(_) => return VisualizerFrame::silent(),
        };
        VisualizerFrame::from_frequency_data(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_selection() {
        // 128 bins -> step 6 -> bins 0, 6, 12, ... 114
        let data: Vec<u8> = (0..128).map(|i| i as u8).collect();
        let frame = VisualizerFrame::from_frequency_data(&data);

        for (i, value) in frame.values().iter().enumerate() {
            assert_eq!(*value, (i * 6) as f32 / 255.0);
        }
    }

    #[test]
    fn test_full_scale_maps_to_one() {
        let frame = VisualizerFrame::from_frequency_data(&[255; 128]);
        assert!(frame.values().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_short_snapshot_repeats_first_bin() {
        let frame = VisualizerFrame::from_frequency_data(&[51, 200, 200]);
        assert!(frame.values().iter().all(|&v| v == 0.2));
    }

    #[test]
    fn test_empty_snapshot_is_silent() {
        assert_eq!(VisualizerFrame::from_frequency_data(&[]), VisualizerFrame::silent());
    }

    #[test]
    fn test_sampler_frames_are_bounded() {
        let analyser = Arc::new(Mutex::new(Analyser::new(256)));
        let sampler = FrequencySampler::new(Arc::clone(&analyser));

        let noise: Vec<i16> = (0..1024)
            .map(|i| if i % 3 == 0 { i16::MAX } else { i16::MIN })
            .collect();

        for chunk in noise.chunks(128) {
            analyser.lock().unwrap().push_samples(chunk);
            let frame = sampler.sample();
            assert_eq!(frame.values().len(), VISUALIZER_BARS);
            assert!(frame.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_frame_serializes_as_array() {
        let json = serde_json::to_string(&VisualizerFrame::silent()).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(json.matches(',').count(), VISUALIZER_BARS - 1);
    }
}
