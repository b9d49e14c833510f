// Test doubles shared by the session controller tests
//
// Each integration test binary compiles this module on its own, so not every
// helper is used everywhere.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use live_interview::capture::{
    AnswerPayload, CaptureConstraints, CaptureError, MediaCapture, MediaChunk, MediaStream,
    Recorder, DEFAULT_MIME_TYPE,
};
use live_interview::detection::FrameSource;
use live_interview::questions::{
    EndReply, FeedbackResult, Question, QuestionReply, QuestionService, ServiceError,
};
use live_interview::view::{InterviewView, Notice, PageUpdate};
use live_interview::{SessionConfig, SessionController};
use tokio::sync::{mpsc, oneshot};

// ============================================================================
// Capture
// ============================================================================

/// Frame source whose readiness is fixed up front
pub struct FixedFrames(pub bool);

impl FrameSource for FixedFrames {
    fn is_ready(&self) -> bool {
        self.0
    }
}

/// Capture that counts acquisitions and releases
pub struct CountingCapture {
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    deny: AtomicBool,
    frames_ready: AtomicBool,
    chunks: Vec<Vec<u8>>,
}

impl CountingCapture {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            deny: AtomicBool::new(false),
            frames_ready: AtomicBool::new(true),
            chunks,
        }
    }

    pub fn set_deny(&self, deny: bool) {
        self.deny.store(deny, Ordering::SeqCst);
    }

    /// Streams acquired from now on hand out frames in this state
    pub fn set_frames_ready(&self, ready: bool) {
        self.frames_ready.store(ready, Ordering::SeqCst);
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn payload_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

#[async_trait::async_trait]
impl MediaCapture for CountingCapture {
    async fn acquire(
        &self,
        _constraints: CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::PermissionDenied("user said no".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingStream {
            released: Arc::clone(&self.released),
            frames_ready: self.frames_ready.load(Ordering::SeqCst),
            chunks: self.chunks.clone(),
        }))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

struct CountingStream {
    released: Arc<AtomicUsize>,
    frames_ready: bool,
    chunks: Vec<Vec<u8>>,
}

#[async_trait::async_trait]
impl MediaStream for CountingStream {
    async fn record(&mut self) -> Result<Recorder, CaptureError> {
        let (chunk_tx, chunk_rx) = mpsc::channel(16);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let chunks = self.chunks.clone();

        tokio::spawn(async move {
            for (i, data) in chunks.into_iter().enumerate() {
                let chunk = MediaChunk {
                    data,
                    timestamp_ms: i as u64 * 100,
                };
                if chunk_tx.send(chunk).await.is_err() {
                    return;
                }
            }
            let _ = stop_rx.await;
        });

        Ok(Recorder::new(chunk_rx, stop_tx, DEFAULT_MIME_TYPE))
    }

    fn frame_source(&self) -> Arc<dyn FrameSource> {
        Arc::new(FixedFrames(self.frames_ready))
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// View
// ============================================================================

/// View that remembers every update
#[derive(Default)]
pub struct RecordingView {
    updates: Mutex<Vec<PageUpdate>>,
}

impl RecordingView {
    pub fn updates(&self) -> Vec<PageUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn count(&self, f: impl Fn(&PageUpdate) -> bool) -> usize {
        self.updates().iter().filter(|u| f(u)).count()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                PageUpdate::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn last_transcript(&self) -> Option<String> {
        self.updates().into_iter().rev().find_map(|u| match u {
            PageUpdate::Transcript(t) => Some(t),
            _ => None,
        })
    }

    pub fn last_feedback(&self) -> Option<String> {
        self.updates().into_iter().rev().find_map(|u| match u {
            PageUpdate::Feedback(f) => Some(f),
            _ => None,
        })
    }

    pub fn last_question_text(&self) -> Option<String> {
        self.updates().into_iter().rev().find_map(|u| match u {
            PageUpdate::QuestionText(t) => Some(t),
            _ => None,
        })
    }

    pub fn last_next_enabled(&self) -> Option<bool> {
        self.updates().into_iter().rev().find_map(|u| match u {
            PageUpdate::NextEnabled(e) => Some(e),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.updates.lock().unwrap().clear();
    }
}

impl InterviewView for RecordingView {
    fn render(&self, update: PageUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

// ============================================================================
// Question service
// ============================================================================

/// `None` entries simulate a transport failure
#[derive(Default)]
pub struct StubQuestions {
    pub current: Mutex<VecDeque<Option<QuestionReply>>>,
    pub next: Mutex<VecDeque<Option<QuestionReply>>>,
    pub submit: Mutex<VecDeque<Option<FeedbackResult>>>,
    pub end: Mutex<VecDeque<Option<EndReply>>>,
    pub submitted: Mutex<Vec<(AnswerPayload, String)>>,
    pub end_calls: AtomicUsize,
}

fn transport_failure() -> ServiceError {
    ServiceError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
}

impl StubQuestions {
    pub fn push_current(&self, reply: Option<QuestionReply>) {
        self.current.lock().unwrap().push_back(reply);
    }

    pub fn push_next(&self, reply: Option<QuestionReply>) {
        self.next.lock().unwrap().push_back(reply);
    }

    pub fn push_submit(&self, result: Option<FeedbackResult>) {
        self.submit.lock().unwrap().push_back(result);
    }

    pub fn push_end(&self, reply: Option<EndReply>) {
        self.end.lock().unwrap().push_back(reply);
    }

    pub fn end_calls(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(AnswerPayload, String)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl QuestionService for StubQuestions {
    async fn current_question(&self) -> Result<QuestionReply, ServiceError> {
        match self.current.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(transport_failure()),
            None => Ok(QuestionReply::End),
        }
    }

    async fn next_question(&self) -> Result<QuestionReply, ServiceError> {
        match self.next.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(transport_failure()),
            None => Ok(QuestionReply::End),
        }
    }

    async fn submit_answer(
        &self,
        payload: AnswerPayload,
        question: &str,
    ) -> Result<FeedbackResult, ServiceError> {
        self.submitted
            .lock()
            .unwrap()
            .push((payload, question.to_string()));
        match self.submit.lock().unwrap().pop_front() {
            Some(Some(result)) => Ok(result),
            Some(None) => Err(transport_failure()),
            None => Ok(FeedbackResult {
                transcript: "t".to_string(),
                feedback: "f".to_string(),
                error: None,
            }),
        }
    }

    async fn end_interview(&self) -> Result<EndReply, ServiceError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        match self.end.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(transport_failure()),
            None => Ok(EndReply::Results(Vec::new())),
        }
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub fn question(index: u32, total: u32, text: &str) -> QuestionReply {
    QuestionReply::Question(Question {
        index,
        total,
        text: text.to_string(),
    })
}

/// Producers that never fire within a test, so events are injected by hand
pub fn manual_config() -> SessionConfig {
    SessionConfig {
        tick_interval: Duration::from_secs(3600),
        detection_interval: Duration::from_secs(3600),
        ..SessionConfig::default()
    }
}

pub struct Harness {
    pub controller: SessionController,
    pub capture: Arc<CountingCapture>,
    pub questions: Arc<StubQuestions>,
    pub view: Arc<RecordingView>,
}

pub fn harness(config: SessionConfig) -> Harness {
    let capture = Arc::new(CountingCapture::new(vec![
        b"webm-".to_vec(),
        b"chunk-".to_vec(),
        b"data".to_vec(),
    ]));
    let questions = Arc::new(StubQuestions::default());
    let view = Arc::new(RecordingView::default());

    let controller = SessionController::new(
        config,
        capture.clone(),
        questions.clone(),
        view.clone(),
    );

    Harness {
        controller,
        capture,
        questions,
        view,
    }
}
