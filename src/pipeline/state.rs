use serde::Serialize;

use crate::api::Playlist;

/// The single view state of the recommendation pipeline
///
/// Exactly one variant is active; every transition overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Processing,
    Result {
        emotion: String,
        playlist: Option<Playlist>,
    },
    Failed {
        message: String,
    },
}

impl PipelineState {
    pub fn is_processing(&self) -> bool {
        matches!(self, PipelineState::Processing)
    }

    /// The human-readable failure, if the last run failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            PipelineState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Idle
    }
}
