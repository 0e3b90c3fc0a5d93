use reqwest::{StatusCode, Url};
use tracing::{error, info};

use super::messages::{EmotionResponse, PlaylistResponse};
use crate::capture::AudioArtifact;
use crate::error::{Error, Result};

/// The two remote calls the pipeline depends on
#[async_trait::async_trait]
pub trait InferenceService: Send + Sync {
    /// Classify the emotion in a recording
    async fn predict_emotion(&self, artifact: AudioArtifact) -> Result<String>;

    /// Look up the playlist for a classified emotion
    async fn fetch_playlist(&self, emotion: &str) -> Result<PlaylistResponse>;
}

/// HTTP client for the emotion classification and playlist services
///
/// Both endpoints live under the same base URL.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    base_url: Url,
}

impl InferenceClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("invalid API base URL '{}': {}", base_url, e),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("API base URL '{}' cannot carry a path", base_url),
            });
        }

        info!("Inference API at {}", base_url);

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL plus path segments, each percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

#[async_trait::async_trait]
impl InferenceService for InferenceClient {
    async fn predict_emotion(&self, artifact: AudioArtifact) -> Result<String> {
        let url = self.endpoint(&["predict"]);
        let failed = |message: String| Error::ClassificationFailed { message };

        info!("Classifying {} byte recording via {}", artifact.len(), url);

        let part = reqwest::multipart::Part::bytes(artifact.into_bytes())
            .file_name(crate::capture::ARTIFACT_FILE_NAME)
            .mime_str(crate::capture::ARTIFACT_MIME_TYPE)
            .map_err(|e| failed(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Emotion request failed: {}", e);
                failed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Emotion service returned {}", status);
            return Err(failed(status_text(status)));
        }

        let body: EmotionResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {}", e)))?;

        info!("Classified emotion: {}", body.emotion);

        Ok(body.emotion)
    }

    async fn fetch_playlist(&self, emotion: &str) -> Result<PlaylistResponse> {
        let url = self.endpoint(&["playlist", emotion]);
        let failed = |message: String| Error::PlaylistLookupFailed { message };

        info!("Fetching playlist for '{}' via {}", emotion, url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!("Playlist request failed: {}", e);
            failed(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Playlist service returned {}", status);
            return Err(failed(status_text(status)));
        }

        let body: PlaylistResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {}", e)))?;

        info!(
            "Playlist '{}' with {} tracks",
            body.playlist.name,
            body.playlist.tracks.len()
        );

        Ok(body)
    }
}
