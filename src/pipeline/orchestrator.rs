use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::state::PipelineState;
use crate::api::InferenceService;
use crate::capture::AudioArtifact;

/// How a `submit` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run was in flight; nothing happened
    Rejected,
    /// The run finished and its terminal state was written
    Applied,
    /// The run finished after a `reset` or newer run; its result was dropped
    Superseded,
}

/// Drives emotion classification then playlist lookup, and folds the
/// outcome into one [`PipelineState`]
///
/// Each accepted `submit` starts a new run and bumps the run generation;
/// `reset` bumps it too. A run may only write its terminal state while its
/// generation is still the current one, and the check and the write happen
/// under the state lock.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn InferenceService>,
    state: watch::Sender<PipelineState>,
    generation: AtomicU64,
}

impl PipelineOrchestrator {
    pub fn new(service: Arc<dyn InferenceService>) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            inner: Arc::new(Inner {
                service,
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.inner.state.subscribe()
    }

    /// Run the pipeline on a finished recording
    ///
    /// Resolves once the run is over. Dropping the returned future mid-run
    /// leaves the state at `Processing` until the next `reset`; spawn it if
    /// the caller may go away.
    pub async fn submit(&self, artifact: AudioArtifact) -> RunOutcome {
        let mut run = 0;
        let accepted = self.inner.state.send_if_modified(|state| {
            if state.is_processing() {
                return false;
            }
            run = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = PipelineState::Processing;
            true
        });

        if !accepted {
            warn!("Pipeline busy, ignoring submitted recording");
            return RunOutcome::Rejected;
        }

        info!(
            "Pipeline run {} started ({:.2}s recording)",
            run,
            artifact.duration().as_secs_f64()
        );

        let terminal = self.execute(artifact).await;

        let applied = self.inner.state.send_if_modified(|state| {
            if self.inner.generation.load(Ordering::SeqCst) != run {
                return false;
            }
            *state = terminal;
            true
        });

        if applied {
            info!("Pipeline run {} finished", run);
            RunOutcome::Applied
        } else {
            warn!("Pipeline run {} was superseded, dropping its result", run);
            RunOutcome::Superseded
        }
    }

    /// Return to `Idle` from any state
    ///
    /// An in-flight run keeps going, but its result is discarded.
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *state = PipelineState::Idle;
        });
        info!("Pipeline reset");
    }

    async fn execute(&self, artifact: AudioArtifact) -> PipelineState {
        let service = &self.inner.service;

        let emotion = match service.predict_emotion(artifact).await {
            Ok(emotion) => emotion,
            Err(e) => {
                return PipelineState::Failed {
                    message: e.to_string(),
                }
            }
        };

        match service.fetch_playlist(&emotion).await {
            Ok(response) => PipelineState::Result {
                emotion,
                playlist: Some(response.playlist),
            },
            Err(e) => PipelineState::Failed {
                message: e.to_string(),
            },
        }
    }
}
