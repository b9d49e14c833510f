use serde::Serialize;
use thiserror::Error;

use super::messages::{AnswerRecord, EndInterviewMessage, FeedbackMessage, QuestionMessage};
use crate::capture::AnswerPayload;

/// A request that never produced a usable response
///
/// Non-2xx statuses land here too; callers treat every variant the same way.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// An interview question as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    /// 1-based position
    pub index: u32,
    pub total: u32,
    pub text: String,
}

impl Question {
    /// Completion percentage shown on the progress bar
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        f64::from(self.index) / f64::from(self.total) * 100.0
    }

    /// `Q2/5: text`
    pub fn display_line(&self) -> String {
        let text = if self.text.trim().is_empty() {
            "No question available"
        } else {
            self.text.as_str()
        };
        format!("Q{}/{}: {}", self.index, self.total, text)
    }
}

/// Outcome of asking for the current or next question
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionReply {
    Question(Question),
    /// No questions left
    End,
    /// The backend answered with an `error` field
    Rejected(String),
}

impl QuestionReply {
    pub fn is_end(&self) -> bool {
        matches!(self, QuestionReply::End)
    }
}

impl TryFrom<QuestionMessage> for QuestionReply {
    type Error = ServiceError;

    fn try_from(msg: QuestionMessage) -> Result<Self, Self::Error> {
        if msg.end == Some(true) {
            return Ok(QuestionReply::End);
        }
        if let Some(error) = msg.error.filter(|e| !e.is_empty()) {
            return Ok(QuestionReply::Rejected(error));
        }
        match (msg.index, msg.total) {
            (Some(index), Some(total)) => Ok(QuestionReply::Question(Question {
                index,
                total,
                text: msg.question.unwrap_or_default(),
            })),
            _ => Err(ServiceError::Malformed(
                "question reply without index/total".to_string(),
            )),
        }
    }
}

/// Scoring of one submitted answer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedbackResult {
    pub transcript: String,
    pub feedback: String,
    /// Set when the backend rejected the answer
    pub error: Option<String>,
}

impl From<FeedbackMessage> for FeedbackResult {
    fn from(msg: FeedbackMessage) -> Self {
        Self {
            transcript: msg.transcript.unwrap_or_default(),
            feedback: msg.feedback.unwrap_or_default(),
            error: msg.error.filter(|e| !e.is_empty()),
        }
    }
}

/// Outcome of ending the interview
#[derive(Debug, Clone, PartialEq)]
pub enum EndReply {
    Results(Vec<AnswerRecord>),
    Rejected(String),
}

impl From<EndInterviewMessage> for EndReply {
    fn from(msg: EndInterviewMessage) -> Self {
        match msg.error.filter(|e| !e.is_empty()) {
            Some(error) => EndReply::Rejected(error),
            None => EndReply::Results(msg.results.unwrap_or_default()),
        }
    }
}

/// Remote collaborator tracking interview progress and scoring
#[async_trait::async_trait]
pub trait QuestionService: Send + Sync {
    async fn current_question(&self) -> Result<QuestionReply, ServiceError>;

    async fn next_question(&self) -> Result<QuestionReply, ServiceError>;

    async fn submit_answer(
        &self,
        payload: AnswerPayload,
        question: &str,
    ) -> Result<FeedbackResult, ServiceError>;

    async fn end_interview(&self) -> Result<EndReply, ServiceError>;
}
