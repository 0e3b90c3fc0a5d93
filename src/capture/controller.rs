use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::artifact::AudioArtifact;
use super::config::CaptureConfig;
use super::sampler::{FrequencySampler, VisualizerFrame};
use super::status::{CaptureState, CaptureStatus};
use super::timer::{RecordingTimer, TimerTick};
use crate::audio::{Analyser, AudioBackend, CaptureEvent, FragmentBuffer};
use crate::error::{Error, Result};

/// What a finished session hands to its consumer: the recording, or the
/// reason there is none
pub type CaptureOutcome = Result<AudioArtifact>;

/// Why a session is ending
#[derive(Debug, Clone, PartialEq, Eq)]
enum Ending {
    Stopped,
    TimedOut,
    Disposed,
    Interrupted(String),
}

/// Owns the input device and runs one bounded capture session at a time
///
/// Cloning yields another handle to the same controller. Each session
/// spawns three activities (fragment collector, visualizer sampler,
/// recording timer), and they never outlive it: whichever trigger ends the
/// session (`stop`, the timer, a stream error or `dispose`) takes the
/// session out of its slot and tears everything down, so later triggers
/// find nothing to do.
#[derive(Clone)]
pub struct CaptureController {
    inner: Arc<Inner>,
}

struct Inner {
    config: CaptureConfig,
    slot: Mutex<Slot>,
    status: watch::Sender<CaptureStatus>,
    completions: mpsc::UnboundedSender<CaptureOutcome>,
    session_counter: AtomicU64,
}

struct Slot {
    backend: Box<dyn AudioBackend>,
    active: Option<ActiveSession>,
    disposed: bool,
}

/// Everything a running session holds
struct ActiveSession {
    id: u64,
    /// Shared with the collector, which holds the lock while it runs
    events: Arc<Mutex<mpsc::Receiver<CaptureEvent>>>,
    fragments: Arc<StdMutex<FragmentBuffer>>,
    analyser: Option<Arc<StdMutex<Analyser>>>,
    collector: JoinHandle<()>,
    sampler: JoinHandle<()>,
    timer: JoinHandle<()>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.collector.abort();
        self.sampler.abort();
        self.timer.abort();
    }
}

impl CaptureController {
    /// Create a controller over `backend`
    ///
    /// Returns the receiver on which every completed session delivers
    /// exactly one [`CaptureOutcome`].
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: CaptureConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureOutcome>) {
        let (completions, completions_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(CaptureStatus::idle());

        info!(
            "Capture controller ready ({} backend, {:.1}s limit)",
            backend.name(),
            config.max_duration.as_secs_f64()
        );

        let inner = Inner {
            config,
            slot: Mutex::new(Slot {
                backend,
                active: None,
                disposed: false,
            }),
            status,
            completions,
            session_counter: AtomicU64::new(0),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            completions_rx,
        )
    }

    /// Start a capture session
    ///
    /// Does nothing if a session is already recording. Fails with
    /// [`Error::DeviceUnavailable`] when the device cannot be acquired, in
    /// which case nothing is left running.
    pub async fn start(&self) -> Result<()> {
        let mut slot = self.inner.slot.lock().await;

        if slot.disposed {
            return Err(Error::DeviceUnavailable {
                message: "capture controller has been disposed".to_string(),
            });
        }

        if let Some(active) = &slot.active {
            warn!("Capture session {} already recording", active.id);
            return Ok(());
        }

        let events = match slot.backend.start().await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to acquire audio input ({}): {:#}", slot.backend.name(), e);
                return Err(Error::DeviceUnavailable {
                    message: format!("{:#}", e),
                });
            }
        };

        let id = self.inner.session_counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Starting capture session {} ({})", id, slot.backend.name());

        self.inner.status.send_replace(CaptureStatus::recording(id));

        let config = &self.inner.config;
        let fragments = Arc::new(StdMutex::new(FragmentBuffer::new()));
        let analyser = Arc::new(StdMutex::new(Analyser::new(config.fft_size)));
        let events = Arc::new(Mutex::new(events));
        let weak = Arc::downgrade(&self.inner);

        let collector = tokio::spawn(collect_fragments(
            weak.clone(),
            id,
            Arc::clone(&events),
            Arc::clone(&fragments),
            Arc::clone(&analyser),
        ));
        let sampler = tokio::spawn(run_sampler(
            weak.clone(),
            id,
            FrequencySampler::new(Arc::clone(&analyser)),
            config.sampler_interval,
        ));
        let timer = tokio::spawn(run_timer(
            weak,
            id,
            RecordingTimer::new(config.tick, config.max_duration),
        ));

        slot.active = Some(ActiveSession {
            id,
            events,
            fragments,
            analyser: Some(analyser),
            collector,
            sampler,
            timer,
        });

        Ok(())
    }

    /// Stop the current session and deliver its recording
    ///
    /// Returns `false` if nothing was recording (including when another
    /// trigger got there first).
    pub async fn stop(&self) -> bool {
        self.inner.finish(None, Ending::Stopped).await
    }

    /// Tear the controller down for good
    ///
    /// Ends a running session as `stop` would, then releases the device even
    /// if no session ever ran. Later `start` calls fail. Safe to call more
    /// than once.
    pub async fn dispose(&self) {
        let mut slot = self.inner.slot.lock().await;
        if !slot.disposed {
            info!("Disposing capture controller");
        }
        slot.disposed = true;

        let outcome = self.inner.end_session(&mut slot, None, Ending::Disposed).await;

        if slot.backend.is_capturing() {
            if let Err(e) = slot.backend.stop().await {
                warn!("Failed to release audio backend on dispose: {:#}", e);
            }
        }
        drop(slot);

        if let Some(outcome) = outcome {
            self.inner.deliver(outcome);
        }
    }

    pub fn is_recording(&self) -> bool {
        self.inner.status.borrow().is_recording()
    }

    /// Current snapshot (state, elapsed time, visualizer frame)
    pub fn status(&self) -> CaptureStatus {
        self.inner.status.borrow().clone()
    }

    /// Watch status changes as they happen
    pub fn subscribe(&self) -> watch::Receiver<CaptureStatus> {
        self.inner.status.subscribe()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.inner.config
    }
}

impl Inner {
    /// End the session if it is still the one `expected` names (any session
    /// when `None`), then deliver its outcome
    async fn finish(&self, expected: Option<u64>, ending: Ending) -> bool {
        let mut slot = self.slot.lock().await;
        let outcome = self.end_session(&mut slot, expected, ending).await;
        drop(slot);

        match outcome {
            Some(outcome) => {
                self.deliver(outcome);
                true
            }
            None => false,
        }
    }

    /// Teardown, in order: stop collecting fragments (keeping whatever the
    /// device already delivered), cancel the sampler, cancel the timer,
    /// release the analysis graph, release the device.
    async fn end_session(
        &self,
        slot: &mut Slot,
        expected: Option<u64>,
        ending: Ending,
    ) -> Option<CaptureOutcome> {
        match (&slot.active, expected) {
            (Some(active), Some(id)) if active.id != id => {
                debug!("Ignoring {:?} for stale capture session {}", ending, id);
                return None;
            }
            (None, _) => return None,
            _ => {}
        }
        let mut session = slot.active.take()?;

        info!("Ending capture session {} ({:?})", session.id, ending);

        session.collector.abort();
        let _ = (&mut session.collector).await;

        if !matches!(ending, Ending::Interrupted(_)) {
            drain_pending(&session).await;
        }

        session.sampler.abort();
        let _ = (&mut session.sampler).await;

        session.timer.abort();
        let _ = (&mut session.timer).await;

        session.analyser.take();

        if let Err(e) = slot.backend.stop().await {
            warn!("Failed to release audio backend: {:#}", e);
        }

        self.status.send_modify(|status| {
            status.state = CaptureState::Idle;
            status.visualizer = VisualizerFrame::silent();
        });

        let mut fragments = match session.fragments.lock() {
            Ok(mut fragments) => std::mem::take(&mut *fragments),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        let outcome = match ending {
            Ending::Interrupted(message) => {
                warn!(
                    "Capture session {} interrupted, discarding {} buffered fragments",
                    session.id,
                    fragments.len()
                );
                fragments.clear();
                Err(Error::CaptureInterrupted { message })
            }
            Ending::Stopped | Ending::TimedOut | Ending::Disposed => {
                if fragments.is_empty() {
                    warn!("Capture session {} ended without any audio", session.id);
                }
                fragments
                    .finish(self.config.fallback_sample_rate)
                    .map(AudioArtifact::from_encoded)
                    .map_err(|e| Error::Encoding {
                        message: format!("{:#}", e),
                    })
            }
        };

        if let Ok(artifact) = &outcome {
            info!(
                "Capture session {} complete: {:.2}s of audio, {} bytes",
                session.id,
                artifact.duration().as_secs_f64(),
                artifact.len()
            );
        }

        Some(outcome)
    }

    fn deliver(&self, outcome: CaptureOutcome) {
        if self.completions.send(outcome).is_err() {
            debug!("No consumer for capture outcome, dropping it");
        }
    }

    fn publish_elapsed(&self, session_id: u64, elapsed: Duration) {
        self.status.send_if_modified(|status| {
            if !status.is_live(session_id) {
                return false;
            }
            status.elapsed_ms = elapsed.as_millis() as u64;
            true
        });
    }

    fn publish_frame(&self, session_id: u64, frame: VisualizerFrame) {
        self.status.send_if_modified(|status| {
            if !status.is_live(session_id) || status.visualizer == frame {
                return false;
            }
            status.visualizer = frame;
            true
        });
    }
}

/// Move frames still queued in the event channel into the session's
/// fragments. The collector must already be gone.
async fn drain_pending(session: &ActiveSession) {
    let mut events = session.events.lock().await;
    let mut fragments = match session.fragments.lock() {
        Ok(fragments) => fragments,
        Err(poisoned) => poisoned.into_inner(),
    };

    let mut drained = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            CaptureEvent::Frame(frame) => {
                fragments.push(frame);
                drained += 1;
            }
            CaptureEvent::StreamError(message) => {
                debug!("Stream error after stop ignored: {}", message);
            }
        }
    }

    if drained > 0 {
        debug!("Session {} kept {} queued fragments", session.id, drained);
    }
}

/// End `session_id` from inside one of its own activities.
///
/// Teardown awaits those activities, so it has to run on a task of its own.
fn spawn_finish(inner: Arc<Inner>, session_id: u64, ending: Ending) {
    tokio::spawn(async move {
        inner.finish(Some(session_id), ending).await;
    });
}

async fn collect_fragments(
    inner: Weak<Inner>,
    session_id: u64,
    events: Arc<Mutex<mpsc::Receiver<CaptureEvent>>>,
    fragments: Arc<StdMutex<FragmentBuffer>>,
    analyser: Arc<StdMutex<Analyser>>,
) {
    debug!("Fragment collector for session {} started", session_id);
    let mut events = events.lock().await;

    let message = loop {
        match events.recv().await {
            Some(CaptureEvent::Frame(frame)) => {
                if let Ok(mut analyser) = analyser.lock() {
                    analyser.push_samples(&frame.samples);
                }
                if let Ok(mut fragments) = fragments.lock() {
                    fragments.push(frame);
                }
            }
            Some(CaptureEvent::StreamError(message)) => {
                error!("Capture session {} stream error: {}", session_id, message);
                break message;
            }
            None => break "audio stream closed unexpectedly".to_string(),
        }
    };

    if let Some(inner) = inner.upgrade() {
        spawn_finish(inner, session_id, Ending::Interrupted(message));
    }
}

async fn run_sampler(
    inner: Weak<Inner>,
    session_id: u64,
    sampler: FrequencySampler,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let frame = sampler.sample();

        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.publish_frame(session_id, frame);
    }
}

async fn run_timer(inner: Weak<Inner>, session_id: u64, mut timer: RecordingTimer) {
    let mut ticker = tokio::time::interval(timer.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            return;
        };

        match timer.advance() {
            TimerTick::Running(elapsed) => inner.publish_elapsed(session_id, elapsed),
            TimerTick::Exceeded(elapsed) => {
                inner.publish_elapsed(session_id, elapsed);
                info!(
                    "Capture session {} reached {:.1}s limit, stopping",
                    session_id,
                    elapsed.as_secs_f64()
                );
                spawn_finish(inner, session_id, Ending::TimedOut);
                return;
            }
            TimerTick::Expired => return,
        }
    }
}
