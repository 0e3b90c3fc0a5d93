use crate::capture::CaptureController;
use crate::pipeline::PipelineOrchestrator;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one capture controller behind this service
    pub capture: CaptureController,
    /// Pipeline fed by completed captures
    pub pipeline: PipelineOrchestrator,
}

impl AppState {
    pub fn new(capture: CaptureController, pipeline: PipelineOrchestrator) -> Self {
        Self { capture, pipeline }
    }
}
