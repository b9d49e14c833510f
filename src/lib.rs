pub mod capture;
pub mod config;
pub mod detection;
pub mod http;
pub mod questions;
pub mod session;
pub mod view;

pub use capture::{
    AnswerPayload, CaptureConstraints, CaptureError, MediaCapture, MediaChunk, MediaStream,
    Recorder, ReplayCapture, ReplayConfig,
};
pub use config::Config;
pub use detection::{DetectionError, FaceMonitor, FrameSource, ScriptedFaceMonitor};
pub use http::{create_router, AppState, CannedEvaluator};
pub use questions::{
    AnswerRecord, EndReply, FeedbackResult, HttpQuestionService, Question, QuestionReply,
    QuestionService, ServiceError,
};
pub use session::{
    InterviewPhase, RecordingOutcome, SessionConfig, SessionController, SessionError,
    SessionEvent, SessionState, SessionStats, SubmissionOutcome, TerminationReason,
};
pub use view::{ConsoleView, InterviewView, Notice, PageUpdate};
