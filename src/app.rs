//! Wiring: one capture controller feeding one pipeline.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::api::{InferenceClient, InferenceService};
use crate::audio::{AudioBackend, AudioBackendFactory, AudioSource};
use crate::capture::{CaptureConfig, CaptureController, CaptureOutcome};
use crate::config::Config;
use crate::error::Error;
use crate::pipeline::{PipelineOrchestrator, RunOutcome};

const COMPLETION_CAPACITY: usize = 16;

/// What became of one finished capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The session produced no recording
    CaptureFailed(Error),
    /// The recording went through the pipeline
    Pipeline(RunOutcome),
}

pub struct App {
    capture: CaptureController,
    pipeline: PipelineOrchestrator,
    completions: broadcast::Sender<Completion>,
    forwarder: JoinHandle<()>,
    stop_forwarding: oneshot::Sender<()>,
}

impl App {
    /// Build the app from configuration, capturing from `source`
    pub fn from_config(config: &Config, source: AudioSource) -> Result<Self> {
        let backend = AudioBackendFactory::create(source, config.backend_config())?;
        let service = InferenceClient::new(&config.api.base_url)?;

        Ok(Self::new(backend, config.capture_config(), Arc::new(service)))
    }

    /// Build the app from its parts. Must be called inside a Tokio runtime.
    pub fn new(
        backend: Box<dyn AudioBackend>,
        capture_config: CaptureConfig,
        service: Arc<dyn InferenceService>,
    ) -> Self {
        let (capture, outcomes) = CaptureController::new(backend, capture_config);
        let pipeline = PipelineOrchestrator::new(service);
        let (completions, _) = broadcast::channel(COMPLETION_CAPACITY);
        let (stop_forwarding, stop_rx) = oneshot::channel();

        let forwarder = tokio::spawn(forward_recordings(
            outcomes,
            stop_rx,
            pipeline.clone(),
            completions.clone(),
        ));

        Self {
            capture,
            pipeline,
            completions,
            forwarder,
            stop_forwarding,
        }
    }

    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    pub fn pipeline(&self) -> &PipelineOrchestrator {
        &self.pipeline
    }

    /// Receive one [`Completion`] per capture session that ends from now on
    pub fn completions(&self) -> broadcast::Receiver<Completion> {
        self.completions.subscribe()
    }

    /// Release the device, then stop forwarding recordings
    ///
    /// A session cut short here still goes through the pipeline, and this
    /// waits for that run to finish.
    pub async fn shutdown(self) {
        self.capture.dispose().await;

        let _ = self.stop_forwarding.send(());
        if let Err(e) = self.forwarder.await {
            warn!("Recording forwarder failed: {}", e);
        }
        info!("App shut down");
    }
}

/// Hand every finished recording to the pipeline
///
/// Each submission runs on its own task, so a recording that arrives while
/// a run is in flight is rejected rather than queued. Once told to stop, the
/// outcomes already delivered are forwarded and every run is awaited.
async fn forward_recordings(
    mut outcomes: mpsc::UnboundedReceiver<CaptureOutcome>,
    mut stop: oneshot::Receiver<()>,
    pipeline: PipelineOrchestrator,
    completions: broadcast::Sender<Completion>,
) {
    let mut runs = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            outcome = outcomes.recv() => match outcome {
                Some(outcome) => forward(outcome, &pipeline, &completions, &mut runs),
                None => {
                    debug!("Capture controller gone, recording forwarder exiting");
                    break;
                }
            },
            Some(_) = runs.join_next(), if !runs.is_empty() => {}
            _ = &mut stop => {
                while let Ok(outcome) = outcomes.try_recv() {
                    forward(outcome, &pipeline, &completions, &mut runs);
                }
                break;
            }
        }
    }

    while runs.join_next().await.is_some() {}

    debug!("Recording forwarder stopped");
}

fn forward(
    outcome: CaptureOutcome,
    pipeline: &PipelineOrchestrator,
    completions: &broadcast::Sender<Completion>,
    runs: &mut JoinSet<()>,
) {
    match outcome {
        Ok(artifact) => {
            debug!("Forwarding {} byte recording to pipeline", artifact.len());
            let pipeline = pipeline.clone();
            let completions = completions.clone();
            runs.spawn(async move {
                let run = pipeline.submit(artifact).await;
                let _ = completions.send(Completion::Pipeline(run));
            });
        }
        Err(e) => {
            warn!("Capture produced no recording: {}", e);
            let _ = completions.send(Completion::CaptureFailed(e));
        }
    }
}
