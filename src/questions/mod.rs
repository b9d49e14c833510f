pub mod client;
pub mod messages;
pub mod service;

pub use client::HttpQuestionService;
pub use messages::{
    AnswerRecord, EndInterviewMessage, FeedbackMessage, QuestionListMessage, QuestionMessage,
    StartInterviewMessage,
};
pub use service::{EndReply, FeedbackResult, Question, QuestionReply, QuestionService, ServiceError};
