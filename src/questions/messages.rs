use serde::{Deserialize, Serialize};

/// Body of `/get_current_question` and `/next_question`
///
/// The backend answers with one of `{index, total, question}`, `{end: true}`
/// or `{error}`, sometimes mixing fields (`{error, end: false}`), so every
/// field is optional and the conversion into `QuestionReply` decides.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuestionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `/process_audio`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FeedbackMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One answered question as reported by `/end_interview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub transcript: String,
    pub feedback: String,
}

/// Body of `/end_interview`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EndInterviewMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<AnswerRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `/start_interview`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StartInterviewMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub count: usize,
}

/// Body of `/check_questions`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuestionListMessage {
    /// `null` when no interview is active
    #[serde(default)]
    pub questions: Option<Vec<String>>,
    #[serde(default)]
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
