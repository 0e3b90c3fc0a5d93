pub mod client;
pub mod messages;

pub use client::{InferenceClient, InferenceService};
pub use messages::{EmotionResponse, Playlist, PlaylistResponse, Track};
