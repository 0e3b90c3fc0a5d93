//! Frequency-domain analysis of the live capture, for visualization only.
//!
//! Mirrors the behaviour of a browser `AnalyserNode`: a rolling window of the
//! most recent `fft_size` samples, Blackman window, FFT, time smoothing of the
//! magnitudes, then dB scaling quantized to bytes.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
const MIN_FFT_SIZE: usize = 32;

pub struct Analyser {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    history: VecDeque<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl Analyser {
    /// `fft_size` is rounded up to a power of two, minimum 32
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(MIN_FFT_SIZE).next_power_of_two();
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        Self {
            fft_size,
            fft,
            window: blackman_window(fft_size),
            history: std::iter::repeat(0.0).take(fft_size).collect(),
            smoothed: vec![0.0; fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins in a snapshot (half the FFT size)
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Feed mono PCM samples from the live stream
    pub fn push_samples(&mut self, samples: &[i16]) {
        // Only the tail can ever be inside the window
        let skip = samples.len().saturating_sub(self.fft_size);
        for &sample in &samples[skip..] {
            if self.history.len() == self.fft_size {
                self.history.pop_front();
            }
            self.history.push_back(sample as f32 / i16::MAX as f32);
        }
    }

    /// Current snapshot, one byte per bin, 0 = at or below -100 dB, 255 = at or above -30 dB
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        for (i, (slot, &sample)) in self.scratch.iter_mut().zip(self.history.iter()).enumerate() {
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let scale = 1.0 / self.fft_size as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;

        self.smoothed
            .iter_mut()
            .zip(self.scratch.iter())
            .map(|(previous, bin)| {
                let magnitude = bin.norm() * scale;
                *previous = SMOOTHING_TIME_CONSTANT * *previous
                    + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;

                if *previous <= 0.0 {
                    return 0;
                }
                let db = 20.0 * previous.log10();
                (255.0 / range * (db - MIN_DECIBELS)).clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
        })
        .collect()
}
