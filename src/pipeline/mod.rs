//! Recommendation pipeline: classify the recording, then look up a playlist
//! for the classified emotion.

mod orchestrator;
mod state;

pub use orchestrator::{PipelineOrchestrator, RunOutcome};
pub use state::PipelineState;
