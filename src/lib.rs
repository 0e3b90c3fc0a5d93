pub mod api;
pub mod app;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;

pub use api::{InferenceClient, InferenceService, Playlist, PlaylistResponse, Track};
pub use app::{App, Completion};
pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioSource,
    CaptureEvent,
};
pub use capture::{
    AudioArtifact, CaptureConfig, CaptureController, CaptureOutcome, CaptureState, CaptureStatus,
    VisualizerFrame,
};
pub use self::config::Config;
pub use error::{Error, Result};
pub use http::{create_router, AppState};
pub use pipeline::{PipelineOrchestrator, PipelineState, RunOutcome};
