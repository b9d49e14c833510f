// Integration tests for the recording loop with real producers
//
// The tokio clock is paused, so the 1s ticker and the 500ms face sampler run
// on virtual time and finish instantly.

mod common;

use std::future::pending;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::harness;
use live_interview::detection::{
    DetectionError, FaceMonitor, FrameSource, ScriptedFaceMonitor, ScriptedSample,
};
use live_interview::view::{Notice, PageUpdate};
use live_interview::{
    RecordingOutcome, SessionConfig, SessionError, SessionEvent, SessionState, SubmissionOutcome,
    TerminationReason,
};

#[tokio::test(start_paused = true)]
async fn test_loop_terminates_when_face_disappears() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([1, 1, 0])))
        .await;

    h.controller.start().await?;
    let outcome = h.controller.run_recording(pending()).await?;

    assert_eq!(
        outcome,
        RecordingOutcome::Terminated(TerminationReason::NoFace)
    );
    assert_eq!(h.view.notices(), vec![Notice::NoFace]);
    assert_eq!(h.controller.state(), SessionState::Terminated);
    assert_eq!(h.questions.end_calls(), 1);
    assert_eq!(h.capture.released(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_loop_terminates_on_second_person() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([1, 2])))
        .await;

    h.controller.start().await?;
    let outcome = h.controller.run_recording(pending()).await?;

    assert_eq!(
        outcome,
        RecordingOutcome::Terminated(TerminationReason::MultipleFaces(2))
    );
    assert_eq!(h.view.notices(), vec![Notice::MultipleFaces]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_loop_times_out_without_detector() -> Result<()> {
    let mut h = harness(SessionConfig::default());

    h.controller.start().await?;
    let outcome = h.controller.run_recording(pending()).await?;

    assert_eq!(
        outcome,
        RecordingOutcome::Terminated(TerminationReason::Timeout)
    );
    assert_eq!(h.view.notices(), vec![Notice::Timeout { limit_secs: 60 }]);
    assert_eq!(
        h.view.count(|u| matches!(u, PageUpdate::Timer(_))),
        61,
        "ticks 1..=61"
    );
    assert_eq!(h.questions.end_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_loop_ignores_failed_samples() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::new([ScriptedSample::Fail(
            "decoder hiccup".to_string(),
        )])))
        .await;

    h.controller.start().await?;
    let outcome = h
        .controller
        .run_recording(tokio::time::sleep(Duration::from_millis(2_200)))
        .await?;

    assert!(matches!(
        outcome,
        RecordingOutcome::Submitted(SubmissionOutcome::Scored(_))
    ));
    assert!(h.view.notices().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_user_stop_submits_recording() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([1])))
        .await;

    h.controller.start().await?;
    let outcome = h
        .controller
        .run_recording(tokio::time::sleep(Duration::from_millis(3_100)))
        .await?;

    assert!(matches!(
        outcome,
        RecordingOutcome::Submitted(SubmissionOutcome::Scored(_))
    ));
    assert_eq!(h.view.count(|u| matches!(u, PageUpdate::Timer(_))), 3);
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert!(h.controller.next_enabled());

    let submitted = h.questions.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].0.len(), h.capture.payload_len());
    assert_eq!(h.capture.released(), 1);
    assert_eq!(h.questions.end_calls(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_shorter_ceiling_from_config() -> Result<()> {
    let config = SessionConfig {
        max_recording_secs: 3,
        ..SessionConfig::default()
    };
    let mut h = harness(config);

    h.controller.start().await?;
    let outcome = h.controller.run_recording(pending()).await?;

    assert_eq!(
        outcome,
        RecordingOutcome::Terminated(TerminationReason::Timeout)
    );
    assert_eq!(h.view.notices(), vec![Notice::Timeout { limit_secs: 3 }]);
    assert_eq!(h.view.count(|u| *u == PageUpdate::Timer(4)), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_requires_active_recording() {
    let mut h = harness(SessionConfig::default());
    assert!(h.controller.run_recording(pending()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_toggle_past_ceiling_terminates_instead_of_submitting() -> Result<()> {
    let mut h = harness(SessionConfig::default());

    assert_eq!(h.controller.toggle().await?, None);
    tokio::time::sleep(Duration::from_secs(90)).await;
    let outcome = h.controller.toggle().await?;

    assert_eq!(
        outcome,
        Some(RecordingOutcome::Terminated(TerminationReason::Timeout))
    );
    assert_eq!(h.view.notices(), vec![Notice::Timeout { limit_secs: 60 }]);
    assert!(h.questions.submitted().is_empty());
    assert_eq!(h.questions.end_calls(), 1);
    assert_eq!(h.controller.state(), SessionState::Terminated);
    assert_eq!(h.capture.released(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_toggle_with_no_face_terminates() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([0])))
        .await;

    h.controller.toggle().await?;
    tokio::time::sleep(Duration::from_secs(2)).await;
    let outcome = h.controller.toggle().await?;

    assert_eq!(
        outcome,
        Some(RecordingOutcome::Terminated(TerminationReason::NoFace))
    );
    assert_eq!(h.view.notices(), vec![Notice::NoFace]);
    assert!(h.questions.submitted().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_reports_termination_from_queued_events() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([1, 3])))
        .await;

    h.controller.start().await?;
    tokio::time::sleep(Duration::from_millis(1_600)).await;

    assert!(matches!(
        h.controller.stop().await,
        Err(SessionError::Terminated(TerminationReason::MultipleFaces(3)))
    ));
    assert_eq!(h.view.notices(), vec![Notice::MultipleFaces]);
    assert!(h.questions.submitted().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_long_unpolled_recording_still_times_out() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([1])))
        .await;

    // Samples fill the queue long before the ticker reaches the ceiling
    h.controller.toggle().await?;
    tokio::time::sleep(Duration::from_secs(90)).await;
    let outcome = h.controller.toggle().await?;

    assert_eq!(
        outcome,
        Some(RecordingOutcome::Terminated(TerminationReason::Timeout))
    );
    assert!(h.questions.submitted().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_toggle_within_limits_submits() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([1])))
        .await;

    h.controller.toggle().await?;
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    let outcome = h.controller.toggle().await?;

    assert!(matches!(
        outcome,
        Some(RecordingOutcome::Submitted(SubmissionOutcome::Scored(_)))
    ));
    assert!(h.view.notices().is_empty());
    assert_eq!(h.view.count(|u| matches!(u, PageUpdate::Timer(_))), 5);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_no_samples_until_frames_are_ready() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    h.capture.set_frames_ready(false);
    h.controller
        .load_detector(Arc::new(ScriptedFaceMonitor::from_counts([0])))
        .await;

    h.controller.start().await?;

    let mut seen = Vec::new();
    let deadline = tokio::time::sleep(Duration::from_millis(3_100));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = h.controller.next_event() => match event {
                Some(event) => seen.push(event),
                None => break,
            },
        }
    }

    assert!(!seen.iter().any(|e| matches!(e, SessionEvent::Sample(_))));
    assert_eq!(
        seen.iter().filter(|e| matches!(e, SessionEvent::Tick)).count(),
        3
    );

    let outcome = h.controller.stop().await?;
    assert!(matches!(outcome, SubmissionOutcome::Scored(_)));
    assert!(h.view.notices().is_empty());
    assert_eq!(h.controller.state(), SessionState::Idle);
    Ok(())
}

/// Detector whose inference takes two seconds; counts samples in progress
#[derive(Default)]
struct SlowMonitor {
    in_flight: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl FaceMonitor for SlowMonitor {
    async fn load(&self) -> Result<(), DetectionError> {
        Ok(())
    }

    async fn sample(
        &self,
        _frames: &dyn FrameSource,
        _timestamp_ms: i64,
    ) -> Result<usize, DetectionError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&self.in_flight));
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(1)
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_waits_for_inference_to_wind_down() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    let monitor = Arc::new(SlowMonitor::default());
    let in_flight = Arc::clone(&monitor.in_flight);
    h.controller.load_detector(monitor).await;

    h.controller.start().await?;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(in_flight.load(Ordering::SeqCst), 1);

    h.controller.stop().await?;

    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(h.capture.released(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_terminate_waits_for_inference_to_wind_down() -> Result<()> {
    let mut h = harness(SessionConfig::default());
    let monitor = Arc::new(SlowMonitor::default());
    let in_flight = Arc::clone(&monitor.in_flight);
    h.controller.load_detector(monitor).await;

    h.controller.start().await?;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(h.controller.terminate(TerminationReason::NoFace).await);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    Ok(())
}
