use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::session::{Session, SessionEvent};
use super::stats::SessionStats;
use crate::capture::{AnswerPayload, CaptureConstraints, CaptureError, MediaCapture};
use crate::detection::{check_face_count, FaceMonitor, FaceViolation};
use crate::questions::{
    AnswerRecord, EndReply, FeedbackResult, Question, QuestionReply, QuestionService, ServiceError,
};
use crate::view::{InterviewView, Notice, PageUpdate};

/// Question text sent when no question has been loaded
pub const NO_QUESTION: &str = "No question provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Recording,
    Submitting,
    /// Recording was forced to end; no further recordings
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    Active,
    Ended,
}

/// Why a recording was forced to end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    NoFace,
    MultipleFaces(usize),
    Timeout,
}

impl TerminationReason {
    fn notice(self, limit_secs: u32) -> Notice {
        match self {
            TerminationReason::NoFace => Notice::NoFace,
            TerminationReason::MultipleFaces(_) => Notice::MultipleFaces,
            TerminationReason::Timeout => Notice::Timeout { limit_secs },
        }
    }
}

impl From<FaceViolation> for TerminationReason {
    fn from(violation: FaceViolation) -> Self {
        match violation {
            FaceViolation::NoFace => TerminationReason::NoFace,
            FaceViolation::MultipleFaces(n) => TerminationReason::MultipleFaces(n),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot start recording while {0:?}")]
    NotIdle(SessionState),

    #[error("no recording in progress")]
    NotRecording,

    #[error("the interview has ended")]
    InterviewEnded,

    #[error("moving to the next question is disabled")]
    ProgressionDisabled,

    #[error("recording was terminated: {0:?}")]
    Terminated(TerminationReason),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// What became of a submitted answer
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Transcript and feedback were shown
    Scored(FeedbackResult),
    /// The backend answered with an error message
    Rejected(String),
    /// The request itself failed
    Failed(String),
}

/// How a driven recording ended
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingOutcome {
    Submitted(SubmissionOutcome),
    Terminated(TerminationReason),
}

/// Drives one interview page: question navigation, recording attempts,
/// face policing and answer submission
pub struct SessionController {
    config: SessionConfig,
    capture: Arc<dyn MediaCapture>,
    questions: Arc<dyn QuestionService>,
    view: Arc<dyn InterviewView>,

    /// Loaded face monitor; `None` means detection is off
    monitor: Option<Arc<dyn FaceMonitor>>,

    state: SessionState,
    phase: InterviewPhase,
    current: Option<Question>,
    next_enabled: bool,

    /// The active recording, present iff `state == Recording`
    session: Option<Session>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        capture: Arc<dyn MediaCapture>,
        questions: Arc<dyn QuestionService>,
        view: Arc<dyn InterviewView>,
    ) -> Self {
        Self {
            config,
            capture,
            questions,
            view,
            monitor: None,
            state: SessionState::Idle,
            phase: InterviewPhase::Active,
            current: None,
            next_enabled: false,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> InterviewPhase {
        self.phase
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn next_enabled(&self) -> bool {
        self.next_enabled
    }

    pub fn detection_enabled(&self) -> bool {
        self.monitor.is_some()
    }

    pub fn stats(&self) -> SessionStats {
        let session = self.session.as_ref();
        SessionStats {
            state: self.state,
            is_recording: session.map(Session::is_recording).unwrap_or(false),
            started_at: session.map(Session::started_at),
            elapsed_secs: session.map(Session::elapsed_secs).unwrap_or(0),
            chunks_count: session.map(Session::chunks_count).unwrap_or(0),
            bytes_recorded: session.map(Session::bytes_recorded).unwrap_or(0),
        }
    }

    fn render(&self, update: PageUpdate) {
        self.view.render(update);
    }

    fn set_next_enabled(&mut self, enabled: bool) {
        self.next_enabled = enabled;
        self.render(PageUpdate::NextEnabled(enabled));
    }

    /// Initialise face detection
    ///
    /// A monitor that fails to load leaves detection off for the lifetime of
    /// this controller.
    pub async fn load_detector(&mut self, monitor: Arc<dyn FaceMonitor>) -> bool {
        match monitor.load().await {
            Ok(()) => {
                info!("Face detector '{}' loaded", monitor.name());
                self.monitor = Some(monitor);
                true
            }
            Err(e) => {
                error!("Error loading face detector: {}", e);
                self.monitor = None;
                self.render(PageUpdate::Notice(Notice::DetectionUnavailable));
                false
            }
        }
    }

    // ========================================================================
    // Questions
    // ========================================================================

    /// Show the question the backend is currently on
    pub async fn load_current_question(&mut self) -> Result<QuestionReply, SessionError> {
        match self.questions.current_question().await {
            Ok(reply) => {
                self.show_reply(&reply, false);
                Ok(reply)
            }
            Err(e) => {
                error!("Error loading initial question: {}", e);
                self.render(PageUpdate::QuestionText(
                    "Error loading initial question".to_string(),
                ));
                Err(e.into())
            }
        }
    }

    /// Advance to the next question
    pub async fn next_question(&mut self) -> Result<QuestionReply, SessionError> {
        if self.phase == InterviewPhase::Ended {
            return Err(SessionError::InterviewEnded);
        }
        if self.state != SessionState::Idle {
            return Err(SessionError::NotIdle(self.state));
        }
        if !self.next_enabled {
            return Err(SessionError::ProgressionDisabled);
        }

        match self.questions.next_question().await {
            Ok(reply) => {
                self.show_reply(&reply, true);
                Ok(reply)
            }
            Err(e) => {
                error!("Error loading next question: {}", e);
                self.render(PageUpdate::QuestionText(
                    "Error loading next question".to_string(),
                ));
                Err(e.into())
            }
        }
    }

    fn show_reply(&mut self, reply: &QuestionReply, advancing: bool) {
        match reply {
            QuestionReply::Question(question) => {
                info!("Question {}/{}", question.index, question.total);
                self.render(PageUpdate::QuestionText(question.display_line()));
                self.render(PageUpdate::Progress(question.progress_percent()));
                if advancing {
                    // Locked until this question has been answered
                    self.set_next_enabled(false);
                    self.render(PageUpdate::Transcript("Transcript: ".to_string()));
                    self.render(PageUpdate::Feedback("Feedback: ".to_string()));
                }
                self.current = Some(question.clone());
            }
            QuestionReply::End => {
                info!("No questions left");
                self.render(PageUpdate::QuestionText(
                    "Interview Ended. Results: []".to_string(),
                ));
                self.render(PageUpdate::Progress(100.0));
                self.set_next_enabled(false);
                self.current = None;
                self.phase = InterviewPhase::Ended;
            }
            QuestionReply::Rejected(message) => {
                warn!("Question request rejected: {}", message);
                self.render(PageUpdate::QuestionText(format!("Error: {}", message)));
            }
        }
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Acquire the camera and microphone and start recording
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.phase == InterviewPhase::Ended {
            return Err(SessionError::InterviewEnded);
        }
        if self.state != SessionState::Idle {
            warn!("Start ignored while {:?}", self.state);
            return Err(SessionError::NotIdle(self.state));
        }

        let mut stream = match self.capture.acquire(CaptureConstraints::default()).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Media access denied: {}", e);
                self.render(PageUpdate::Notice(Notice::PermissionDenied));
                self.render(PageUpdate::Recording(false));
                return Err(e.into());
            }
        };

        let recorder = match stream.record().await {
            Ok(recorder) => recorder,
            Err(e) => {
                error!("Failed to start recorder: {}", e);
                stream.release();
                self.render(PageUpdate::Notice(Notice::PermissionDenied));
                self.render(PageUpdate::Recording(false));
                return Err(e.into());
            }
        };

        let session = Session::begin(stream, recorder, &self.config, self.monitor.clone());
        info!(
            "Recording {} started via '{}' (detection {})",
            session.id(),
            self.capture.name(),
            if self.monitor.is_some() { "on" } else { "off" }
        );

        self.session = Some(session);
        self.state = SessionState::Recording;
        self.render(PageUpdate::Recording(true));

        Ok(())
    }

    /// Wait for the next event of the active recording
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.session.as_mut()?.next_event().await
    }

    /// Apply one event; returns the termination it caused, if any
    pub async fn handle_event(&mut self, event: SessionEvent) -> Option<TerminationReason> {
        let session = match self.session.as_mut() {
            Some(session) if self.state == SessionState::Recording => session,
            _ => {
                debug!("Event ignored, no active recording");
                return None;
            }
        };

        let reason = match event {
            SessionEvent::Tick => {
                let elapsed = session.tick();
                self.view.render(PageUpdate::Timer(elapsed));
                (elapsed > self.config.max_recording_secs).then_some(TerminationReason::Timeout)
            }
            SessionEvent::Sample(Ok(face_count)) => {
                check_face_count(face_count).map(TerminationReason::from)
            }
            SessionEvent::Sample(Err(e)) => {
                warn!("Face detection error: {}", e);
                None
            }
            SessionEvent::Chunk(chunk) => {
                session.record_chunk(chunk);
                None
            }
        };

        if let Some(reason) = reason {
            self.terminate(reason).await;
        }
        reason
    }

    /// Force the active recording to end and close the interview
    ///
    /// Returns false (and does nothing) when no recording is active, so
    /// racing triggers terminate at most once.
    pub async fn terminate(&mut self, reason: TerminationReason) -> bool {
        let Some(session) = self.session.take() else {
            debug!("Termination ({:?}) ignored, not recording", reason);
            return false;
        };

        warn!("Terminating recording {}: {:?}", session.id(), reason);
        session.discard().await;
        self.state = SessionState::Terminated;

        self.render(PageUpdate::Recording(false));
        self.render(PageUpdate::Notice(
            reason.notice(self.config.max_recording_secs),
        ));

        self.end_interview().await;
        true
    }

    /// User stop: collect the recording and submit it
    ///
    /// Fails with `SessionError::Terminated` when events queued during the
    /// recording end it instead; nothing is submitted then.
    pub async fn stop(&mut self) -> Result<SubmissionOutcome, SessionError> {
        match self.finish_recording().await? {
            RecordingOutcome::Submitted(outcome) => Ok(outcome),
            RecordingOutcome::Terminated(reason) => Err(SessionError::Terminated(reason)),
        }
    }

    /// Apply whatever the producers queued since the last poll
    ///
    /// Ticks can pile up or stall behind a full queue, so the running time is
    /// checked against the ceiling as well.
    async fn settle_pending(&mut self) -> Option<TerminationReason> {
        while let Some(event) = self.session.as_mut().and_then(Session::try_next_event) {
            if let Some(reason) = self.handle_event(event).await {
                return Some(reason);
            }
        }

        let limit = u64::from(self.config.max_recording_secs);
        let overran = self
            .session
            .as_ref()
            .is_some_and(|session| session.running_secs() > limit);
        if overran && self.terminate(TerminationReason::Timeout).await {
            return Some(TerminationReason::Timeout);
        }
        None
    }

    async fn finish_recording(&mut self) -> Result<RecordingOutcome, SessionError> {
        if self.state != SessionState::Recording {
            return Err(SessionError::NotRecording);
        }
        if let Some(reason) = self.settle_pending().await {
            return Ok(RecordingOutcome::Terminated(reason));
        }
        let session = self.session.take().ok_or(SessionError::NotRecording)?;

        self.state = SessionState::Submitting;
        self.render(PageUpdate::Recording(false));

        let payload = session.finish().await;
        let outcome = self.submit(payload).await;

        self.state = SessionState::Idle;
        Ok(RecordingOutcome::Submitted(outcome))
    }

    /// Start when idle, stop when recording
    pub async fn toggle(&mut self) -> Result<Option<RecordingOutcome>, SessionError> {
        match self.state {
            SessionState::Recording => self.finish_recording().await.map(Some),
            _ => self.start().await.map(|_| None),
        }
    }

    /// Pump events until `stop` resolves or the recording is terminated
    pub async fn run_recording<F>(&mut self, stop: F) -> Result<RecordingOutcome, SessionError>
    where
        F: Future<Output = ()>,
    {
        if self.state != SessionState::Recording {
            return Err(SessionError::NotRecording);
        }

        tokio::pin!(stop);

        loop {
            let step = tokio::select! {
                _ = &mut stop => None,
                event = self.next_event() => Some(event),
            };

            match step {
                Some(Some(event)) => {
                    if let Some(reason) = self.handle_event(event).await {
                        return Ok(RecordingOutcome::Terminated(reason));
                    }
                }
                Some(None) => {
                    warn!("Recording producers stopped, finishing answer");
                    return self.finish_recording().await;
                }
                None => return self.finish_recording().await,
            }
        }
    }

    async fn submit(&mut self, payload: AnswerPayload) -> SubmissionOutcome {
        self.render(PageUpdate::Feedback("Analyzing...".to_string()));

        let question = self
            .current
            .as_ref()
            .map(|q| q.text.trim())
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_QUESTION)
            .to_string();

        let outcome = match self.questions.submit_answer(payload, &question).await {
            Ok(result) => match result.error.clone() {
                Some(message) => {
                    warn!("Answer rejected: {}", message);
                    self.render(PageUpdate::Transcript(format!("Error: {}", message)));
                    self.render(PageUpdate::Feedback(String::new()));
                    SubmissionOutcome::Rejected(message)
                }
                None => {
                    self.show_feedback(&result);
                    SubmissionOutcome::Scored(result)
                }
            },
            Err(e) => {
                error!("Answer submission failed: {}", e);
                self.render(PageUpdate::Transcript("Error processing audio".to_string()));
                self.render(PageUpdate::Feedback(String::new()));
                SubmissionOutcome::Failed(e.to_string())
            }
        };

        self.set_next_enabled(true);
        outcome
    }

    fn show_feedback(&self, result: &FeedbackResult) {
        let transcript = if result.transcript.is_empty() {
            "No transcription"
        } else {
            result.transcript.as_str()
        };
        let feedback = if result.feedback.is_empty() {
            "No feedback"
        } else {
            result.feedback.as_str()
        };

        self.render(PageUpdate::Transcript(format!("Transcript: {}", transcript)));
        self.render(PageUpdate::Feedback(format!("Feedback: {}", feedback)));

        let marker = self.config.perfect_score_marker.as_str();
        if !marker.is_empty() && result.feedback.contains(marker) {
            info!("Perfect score");
            self.render(PageUpdate::Celebrate);
        }
    }

    // ========================================================================
    // End of interview
    // ========================================================================

    /// Close the interview and show the collected results
    ///
    /// An active recording is discarded without being submitted.
    pub async fn end_interview(&mut self) -> Option<Vec<AnswerRecord>> {
        if let Some(session) = self.session.take() {
            info!("Ending interview during recording {}", session.id());
            session.discard().await;
            self.state = SessionState::Idle;
            self.render(PageUpdate::Recording(false));
        }

        match self.questions.end_interview().await {
            Ok(EndReply::Results(results)) => {
                let json = serde_json::to_string(&results).unwrap_or_else(|_| "[]".to_string());
                info!("Interview ended with {} answers", results.len());
                self.render(PageUpdate::QuestionText(format!(
                    "Interview Ended. Results: {}",
                    json
                )));
                self.render(PageUpdate::Progress(100.0));
                self.set_next_enabled(false);
                self.phase = InterviewPhase::Ended;
                Some(results)
            }
            Ok(EndReply::Rejected(message)) => {
                warn!("End of interview rejected: {}", message);
                self.render(PageUpdate::QuestionText(format!("Error: {}", message)));
                None
            }
            Err(e) => {
                error!("Error ending interview: {}", e);
                self.render(PageUpdate::QuestionText("Error ending interview".to_string()));
                None
            }
        }
    }
}
