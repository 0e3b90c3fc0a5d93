use std::time::Duration;

/// Configuration for capture sessions
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Hard ceiling on a single recording; the session stops itself here
    /// Default: 3 seconds
    pub max_duration: Duration,

    /// Recording timer resolution
    /// Default: 100ms
    pub tick: Duration,

    /// How often the visualizer frame is refreshed
    /// Default: 16ms (~60 Hz)
    pub sampler_interval: Duration,

    /// FFT window of the analysis graph (half of it is the bin count)
    pub fft_size: usize,

    /// Sample rate written to the header of an empty recording
    pub fallback_sample_rate: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_millis(3000),
            tick: Duration::from_millis(100),
            sampler_interval: Duration::from_millis(16),
            fft_size: 256,
            fallback_sample_rate: 16000,
        }
    }
}
