use serde::Serialize;
use std::time::Duration;

use super::sampler::VisualizerFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Idle,
    Recording,
}

/// Observable snapshot of the capture controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureStatus {
    /// Whether a session is currently active
    pub state: CaptureState,

    /// Most recent session, if any has run
    pub session_id: Option<u64>,

    /// Elapsed recording time as counted by the recording timer.
    /// Kept after the session ends so the final value stays readable.
    pub elapsed_ms: u64,

    /// Latest visualizer frame; silent while idle
    pub visualizer: VisualizerFrame,
}

impl CaptureStatus {
    pub fn idle() -> Self {
        Self {
            state: CaptureState::Idle,
            session_id: None,
            elapsed_ms: 0,
            visualizer: VisualizerFrame::silent(),
        }
    }

    pub(crate) fn recording(session_id: u64) -> Self {
        Self {
            state: CaptureState::Recording,
            session_id: Some(session_id),
            elapsed_ms: 0,
            visualizer: VisualizerFrame::silent(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// True while `session_id` is the session currently recording
    pub(crate) fn is_live(&self, session_id: u64) -> bool {
        self.is_recording() && self.session_id == Some(session_id)
    }
}

impl Default for CaptureStatus {
    fn default() -> Self {
        Self::idle()
    }
}
