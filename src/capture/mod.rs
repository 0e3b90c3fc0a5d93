//! Capture session management
//!
//! This module provides the `CaptureController` that manages:
//! - Input device acquisition and release
//! - Fragment collection into a single WAV artifact
//! - The bounded recording timer (auto-stop)
//! - Live visualizer frames from the analysis graph

mod artifact;
mod config;
mod controller;
mod sampler;
mod status;
mod timer;

pub use artifact::{AudioArtifact, ARTIFACT_FILE_NAME, ARTIFACT_MIME_TYPE};
pub use self::config::CaptureConfig;
pub use controller::{CaptureController, CaptureOutcome};
pub use sampler::{FrequencySampler, VisualizerFrame, VISUALIZER_BARS};
pub use status::{CaptureState, CaptureStatus};
pub use timer::{RecordingTimer, TimerTick};
