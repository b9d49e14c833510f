use std::sync::Arc;

use tokio::sync::RwLock;

use crate::questions::AnswerRecord;

/// Transcript and feedback for one answer
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub transcript: String,
    pub feedback: String,
}

/// Turns a recorded answer into a transcript and feedback
#[async_trait::async_trait]
pub trait AnswerEvaluator: Send + Sync {
    async fn evaluate(&self, question: &str, media: &[u8]) -> anyhow::Result<Evaluation>;
}

/// Evaluator that answers every submission the same way
pub struct CannedEvaluator {
    transcript: String,
    feedback: String,
}

impl CannedEvaluator {
    pub fn new(transcript: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            feedback: feedback.into(),
        }
    }
}

#[async_trait::async_trait]
impl AnswerEvaluator for CannedEvaluator {
    async fn evaluate(&self, _question: &str, media: &[u8]) -> anyhow::Result<Evaluation> {
        if media.is_empty() {
            anyhow::bail!("empty recording");
        }
        Ok(Evaluation {
            transcript: self.transcript.clone(),
            feedback: self.feedback.clone(),
        })
    }
}

/// Progress through one interview
#[derive(Debug, Default)]
pub struct InterviewBook {
    pub session_id: String,
    pub questions: Vec<String>,
    /// 0-based index of the current question
    pub current: usize,
    pub answers: Vec<AnswerRecord>,
    /// False once the interview has been ended
    pub active: bool,
}

impl InterviewBook {
    pub fn new(questions: Vec<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            questions,
            current: 0,
            answers: Vec::new(),
            active: true,
        }
    }
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub book: Arc<RwLock<InterviewBook>>,
    pub evaluator: Arc<dyn AnswerEvaluator>,
    /// Questions every new interview starts from
    pub questions: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(questions: Vec<String>, evaluator: Arc<dyn AnswerEvaluator>) -> Self {
        Self {
            book: Arc::new(RwLock::new(InterviewBook::new(questions.clone()))),
            evaluator,
            questions: Arc::new(questions),
        }
    }

    /// Replace the current interview with a fresh one
    pub async fn restart(&self) -> String {
        let fresh = InterviewBook::new(self.questions.as_ref().clone());
        let session_id = fresh.session_id.clone();
        *self.book.write().await = fresh;
        session_id
    }
}
