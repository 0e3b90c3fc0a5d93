pub mod analyser;
pub mod backend;
pub mod convert;
pub mod encoder;
pub mod file;
pub mod microphone;

pub use analyser::Analyser;
pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource, CaptureEvent};
pub use encoder::{EncodedWav, FragmentBuffer};
pub use file::{AudioFile, FileBackend};
pub use microphone::{list_devices, MicrophoneBackend};
