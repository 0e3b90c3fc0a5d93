//! Error kinds surfaced by the capture controller and the pipeline.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Permission denied or no usable input device
    #[error("Could not access microphone: {message}")]
    DeviceUnavailable { message: String },

    /// The device stream failed after the session started
    #[error("Recording interrupted: {message}")]
    CaptureInterrupted { message: String },

    /// Transport failure, non-2xx status or malformed body from `/predict`
    #[error("Failed to predict emotion: {message}")]
    ClassificationFailed { message: String },

    /// Transport failure, non-2xx status or malformed body from `/playlist`
    #[error("Failed to fetch playlist: {message}")]
    PlaylistLookupFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to encode recording: {message}")]
    Encoding { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
