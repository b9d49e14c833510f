use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::messages::{
    EndInterviewMessage, FeedbackMessage, QuestionListMessage, QuestionMessage,
    StartInterviewMessage,
};
use super::service::{EndReply, FeedbackResult, QuestionReply, QuestionService, ServiceError};
use crate::capture::AnswerPayload;

/// HTTP client for the interview backend
///
/// The backend keeps interview progress in a cookie session, so the client
/// carries a cookie store across calls.
pub struct HttpQuestionService {
    client: Client,
    base_url: String,
}

impl HttpQuestionService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        info!("Question service at {}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Ask the backend for a fresh interview; returns its question count
    pub async fn start_interview(&self) -> Result<usize, ServiceError> {
        let response = self.client.post(self.url("/start_interview")).send().await?;
        let msg: StartInterviewMessage = Self::decode(response).await?;
        info!(
            "Interview {} started with {} questions",
            msg.session_id.as_deref().unwrap_or("?"),
            msg.count
        );
        Ok(msg.count)
    }

    /// Questions of the active interview, empty when none is active
    pub async fn check_questions(&self) -> Result<Vec<String>, ServiceError> {
        let msg: QuestionListMessage = self.get_json("/check_questions").await?;
        if let Some(error) = msg.error {
            debug!("check_questions: {}", error);
        }
        Ok(msg.questions.unwrap_or_default())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            debug!("{} returned {}", response.url(), status);
            return Err(ServiceError::Status(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl QuestionService for HttpQuestionService {
    async fn current_question(&self) -> Result<QuestionReply, ServiceError> {
        let msg: QuestionMessage = self.get_json("/get_current_question").await?;
        QuestionReply::try_from(msg)
    }

    async fn next_question(&self) -> Result<QuestionReply, ServiceError> {
        let msg: QuestionMessage = self.get_json("/next_question").await?;
        QuestionReply::try_from(msg)
    }

    async fn submit_answer(
        &self,
        payload: AnswerPayload,
        question: &str,
    ) -> Result<FeedbackResult, ServiceError> {
        info!(
            "Submitting answer ({} bytes) for question: {}",
            payload.len(),
            question
        );

        let audio = Part::bytes(payload.bytes)
            .file_name(payload.file_name)
            .mime_str(&payload.mime_type)?;
        let form = Form::new()
            .part("audio", audio)
            .text("question", question.to_string());

        let response = self
            .client
            .post(self.url("/process_audio"))
            .multipart(form)
            .send()
            .await?;

        let msg: FeedbackMessage = Self::decode(response).await?;
        Ok(FeedbackResult::from(msg))
    }

    async fn end_interview(&self) -> Result<EndReply, ServiceError> {
        let msg: EndInterviewMessage = self.get_json("/end_interview").await?;
        Ok(EndReply::from(msg))
    }
}
