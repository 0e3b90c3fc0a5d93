// Integration tests for the capture controller
//
// Time is paused, so the 3s recording limit elapses instantly and
// deterministically.

mod common;

use anyhow::Result;
use common::{tone_frame, MockBackend};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, Instant};
use voicemood::{CaptureConfig, CaptureController, CaptureOutcome, CaptureState, Error};

fn controller(backend: MockBackend) -> (CaptureController, UnboundedReceiver<CaptureOutcome>) {
    CaptureController::new(Box::new(backend), CaptureConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_denied_device_leaves_nothing_running() -> Result<()> {
    let (backend, probe) = MockBackend::denied();
    let (controller, mut outcomes) = controller(backend);

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable { .. }));
    assert!(err.to_string().starts_with("Could not access microphone"));

    assert!(!controller.is_recording());
    assert_eq!(probe.starts(), 1);

    // No timer runs: nothing ticks, nothing is delivered
    sleep(Duration::from_secs(5)).await;
    assert_eq!(controller.status().elapsed_ms, 0);
    assert!(outcomes.try_recv().is_err());
    assert_eq!(probe.stops(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_auto_stop_at_limit_delivers_once() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let backend = backend.with_frames(vec![tone_frame(0), tone_frame(100)]);
    let (controller, mut outcomes) = controller(backend);

    let started = Instant::now();
    controller.start().await?;
    assert!(controller.is_recording());

    let artifact = outcomes.recv().await.expect("session outcome")?;
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(3), "stopped after {:?}", waited);
    assert!(waited < Duration::from_millis(3100), "stopped after {:?}", waited);

    let status = controller.status();
    assert_eq!(status.state, CaptureState::Idle);
    assert_eq!(status.elapsed_ms, 3000);
    assert_eq!(probe.stops(), 1);
    assert!(!probe.is_open());

    assert_eq!(artifact.sample_rate(), 16000);
    assert_eq!(artifact.channels(), 1);
    assert_eq!(artifact.duration(), Duration::from_millis(200));
    assert_eq!(&artifact.bytes()[..4], b"RIFF");

    // Only one outcome per session, however long we wait
    sleep(Duration::from_secs(5)).await;
    assert!(outcomes.try_recv().is_err());
    assert_eq!(probe.stops(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_manual_stop_before_limit() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend.with_frames(vec![tone_frame(0)]));

    controller.start().await?;
    sleep(Duration::from_millis(1250)).await;
    assert_eq!(controller.status().elapsed_ms, 1200);

    assert!(controller.stop().await);
    assert!(!controller.is_recording());

    let artifact = outcomes.recv().await.expect("session outcome")?;
    assert_eq!(artifact.duration(), Duration::from_millis(100));

    // The timer is gone: the limit passing later changes nothing
    sleep(Duration::from_secs(3)).await;
    assert!(outcomes.try_recv().is_err());
    assert_eq!(controller.status().elapsed_ms, 1200);
    assert_eq!(probe.stops(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_when_idle_is_noop() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend);

    assert!(!controller.stop().await);
    assert_eq!(probe.stops(), 0);
    assert!(outcomes.try_recv().is_err());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_start_while_recording_is_noop() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend);

    controller.start().await?;
    let first = controller.status().session_id;

    sleep(Duration::from_millis(500)).await;
    controller.start().await?;

    assert_eq!(probe.starts(), 1);
    assert_eq!(controller.status().session_id, first);

    // The original session keeps its own clock
    sleep(Duration::from_secs(3)).await;
    assert!(outcomes.recv().await.expect("session outcome").is_ok());
    assert!(outcomes.try_recv().is_err());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_triggers_tear_down_once() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend.with_frames(vec![tone_frame(0)]));

    controller.start().await?;
    sleep(Duration::from_millis(300)).await;

    let (a, b, ()) = tokio::join!(controller.stop(), controller.stop(), controller.dispose());
    assert!(!(a && b), "only one stop can win");

    assert_eq!(probe.stops(), 1);
    assert!(outcomes.recv().await.expect("session outcome").is_ok());

    sleep(Duration::from_secs(5)).await;
    assert!(outcomes.try_recv().is_err());
    assert_eq!(probe.stops(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_racing_auto_stop() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend);

    controller.start().await?;
    sleep(Duration::from_millis(3000)).await;
    controller.stop().await;

    assert!(outcomes.recv().await.expect("session outcome").is_ok());
    sleep(Duration::from_secs(1)).await;
    assert!(outcomes.try_recv().is_err());
    assert_eq!(probe.stops(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stream_error_discards_recording() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend.with_frames(vec![tone_frame(0)]));

    controller.start().await?;
    sleep(Duration::from_millis(500)).await;
    probe.fail("device unplugged");

    let outcome = outcomes.recv().await.expect("session outcome");
    assert_eq!(
        outcome,
        Err(Error::CaptureInterrupted {
            message: "device unplugged".to_string()
        })
    );

    assert!(!controller.is_recording());
    assert_eq!(probe.stops(), 1);

    sleep(Duration::from_secs(3)).await;
    assert!(outcomes.try_recv().is_err());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dispose_ends_session_and_is_repeatable() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend.with_frames(vec![tone_frame(0)]));

    controller.start().await?;
    sleep(Duration::from_millis(200)).await;

    controller.dispose().await;
    controller.dispose().await;

    assert!(outcomes.recv().await.expect("session outcome").is_ok());
    assert!(outcomes.try_recv().is_err());
    assert_eq!(probe.stops(), 1);
    assert!(!controller.is_recording());

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable { .. }));
    assert_eq!(probe.starts(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dispose_without_session() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend);

    controller.dispose().await;

    assert!(outcomes.try_recv().is_err());
    assert_eq!(probe.stops(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_sessions_can_follow_each_other() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend);

    controller.start().await?;
    controller.stop().await;
    assert!(outcomes.recv().await.expect("first outcome").is_ok());

    controller.start().await?;
    let status = controller.status();
    assert!(status.is_recording());
    assert_eq!(status.session_id, Some(2));
    assert_eq!(status.elapsed_ms, 0);

    assert!(outcomes.recv().await.expect("second outcome").is_ok());
    assert_eq!(controller.status().elapsed_ms, 3000);
    assert_eq!(probe.starts(), 2);
    assert_eq!(probe.stops(), 2);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_visualizer_frames_are_normalized() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, _outcomes) = controller(backend);

    controller.start().await?;
    for i in 0..5 {
        probe.send_frame(tone_frame(i * 100));
        sleep(Duration::from_millis(100)).await;
    }

    let frame = controller.status().visualizer;
    assert_eq!(frame.values().len(), 20);
    assert!(frame.values().iter().all(|v| (0.0..=1.0).contains(v)));
    assert!(frame.values().iter().any(|v| *v > 0.0), "tone should register");

    controller.stop().await;
    let frame = controller.status().visualizer;
    assert!(frame.values().iter().all(|v| *v == 0.0));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_keeps_frames_already_delivered() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend);

    controller.start().await?;
    sleep(Duration::from_millis(500)).await;

    // Queued by the device but not yet picked up by the collector
    for i in 0..3 {
        probe.send_frame(tone_frame(500 + i * 100));
    }
    assert!(controller.stop().await);

    let artifact = outcomes.recv().await.expect("session outcome")?;
    assert_eq!(artifact.duration(), Duration::from_millis(300));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stream_error_does_not_keep_queued_frames() -> Result<()> {
    let (backend, probe) = MockBackend::new();
    let (controller, mut outcomes) = controller(backend);

    controller.start().await?;
    sleep(Duration::from_millis(200)).await;

    probe.fail("device unplugged");
    probe.send_frame(tone_frame(200));

    let outcome = outcomes.recv().await.expect("session outcome");
    assert!(matches!(outcome, Err(Error::CaptureInterrupted { .. })));
    assert!(outcomes.try_recv().is_err());

    Ok(())
}
