use super::state::{AppState, InterviewBook};
use crate::questions::{
    AnswerRecord, EndInterviewMessage, FeedbackMessage, QuestionListMessage, QuestionMessage,
    StartInterviewMessage,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info, warn};

// ============================================================================
// Helpers
// ============================================================================

fn question_error(status: StatusCode, error: &str, end: Option<bool>) -> Response {
    (
        status,
        Json(QuestionMessage {
            error: Some(error.to_string()),
            end,
            ..Default::default()
        }),
    )
        .into_response()
}

fn feedback_error(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(FeedbackMessage {
            transcript: Some(String::new()),
            feedback: Some(String::new()),
            error: Some(error.to_string()),
        }),
    )
        .into_response()
}

/// Reply for whatever question the book is on
fn current_reply(book: &InterviewBook) -> Response {
    let idx = book.current;
    let total = book.questions.len();

    if idx >= total {
        info!("End of questions reached");
        return (
            StatusCode::OK,
            Json(QuestionMessage {
                end: Some(true),
                ..Default::default()
            }),
        )
            .into_response();
    }

    let question = book.questions[idx].trim();
    if question.is_empty() {
        error!("Empty question at index {}", idx);
        return question_error(StatusCode::BAD_REQUEST, "Invalid question data", None);
    }

    let progress = (idx + 1) as f64 / total as f64 * 100.0;
    info!("Serving question {}/{} ({:.0}%)", idx + 1, total, progress);

    (
        StatusCode::OK,
        Json(QuestionMessage {
            index: Some((idx + 1) as u32),
            total: Some(total as u32),
            question: Some(question.to_string()),
            progress: Some(progress),
            ..Default::default()
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /start_interview
/// Start a fresh interview over the configured questions
pub async fn start_interview(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.restart().await;
    info!(
        "New interview started: {} with {} questions",
        session_id,
        state.questions.len()
    );

    (
        StatusCode::OK,
        Json(StartInterviewMessage {
            session_id: Some(session_id),
            count: state.questions.len(),
        }),
    )
}

/// GET /check_questions
pub async fn check_questions(State(state): State<AppState>) -> impl IntoResponse {
    let book = state.book.read().await;

    let body = if book.active {
        QuestionListMessage {
            questions: Some(book.questions.clone()),
            count: book.questions.len(),
            error: None,
        }
    } else {
        QuestionListMessage {
            questions: None,
            count: 0,
            error: Some("No questions in session".to_string()),
        }
    };

    (StatusCode::OK, Json(body))
}

/// GET /get_current_question
pub async fn get_current_question(State(state): State<AppState>) -> impl IntoResponse {
    let book = state.book.read().await;

    if !book.active {
        error!("No active interview in get_current_question");
        return question_error(
            StatusCode::BAD_REQUEST,
            "No active session or questions available",
            None,
        );
    }

    current_reply(&book)
}

/// GET /next_question
/// Advance, then answer like /get_current_question
pub async fn next_question(State(state): State<AppState>) -> impl IntoResponse {
    let mut book = state.book.write().await;

    if !book.active {
        error!("No active interview in next_question");
        return question_error(StatusCode::BAD_REQUEST, "No active session", Some(false));
    }

    book.current += 1;
    info!("Moving to next question: {}", book.current);

    current_reply(&book)
}

/// POST /process_audio
/// Multipart form with `audio` (file) and `question` (text)
pub async fn process_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut audio: Option<Vec<u8>> = None;
    let mut question: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Malformed multipart body: {}", e);
                return feedback_error(StatusCode::BAD_REQUEST, "Audio and question required");
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => match field.bytes().await {
                Ok(bytes) => audio = Some(bytes.to_vec()),
                Err(e) => {
                    error!("Failed to read audio field: {}", e);
                    return feedback_error(StatusCode::BAD_REQUEST, "Audio and question required");
                }
            },
            "question" => match field.text().await {
                Ok(text) => question = Some(text),
                Err(e) => {
                    error!("Failed to read question field: {}", e);
                    return feedback_error(StatusCode::BAD_REQUEST, "Audio and question required");
                }
            },
            other => warn!("Ignoring unexpected field '{}'", other),
        }
    }

    let (Some(audio), Some(question)) = (audio, question) else {
        error!("Audio or question missing in process_audio request");
        return feedback_error(StatusCode::BAD_REQUEST, "Audio and question required");
    };

    if !state.book.read().await.active {
        error!("No active interview in process_audio");
        return feedback_error(StatusCode::BAD_REQUEST, "No active session");
    }

    let evaluation = match state.evaluator.evaluate(&question, &audio).await {
        Ok(evaluation) => evaluation,
        Err(e) => {
            error!("Processing audio failed: {}", e);
            return feedback_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let transcript = if evaluation.transcript.trim().is_empty() {
        warn!("Transcription returned empty result");
        "No transcription available".to_string()
    } else {
        evaluation.transcript
    };
    let feedback = if evaluation.feedback.trim().is_empty() {
        warn!("Feedback returned empty result");
        "No feedback available".to_string()
    } else {
        evaluation.feedback
    };

    state.book.write().await.answers.push(AnswerRecord {
        question: question.clone(),
        transcript: transcript.clone(),
        feedback: feedback.clone(),
    });

    info!(
        "Processed {} bytes for question: {}",
        audio.len(),
        question
    );

    (
        StatusCode::OK,
        Json(FeedbackMessage {
            transcript: Some(transcript),
            feedback: Some(feedback),
            error: None,
        }),
    )
        .into_response()
}

/// GET /end_interview
/// Return the recorded answers and close the interview
pub async fn end_interview(State(state): State<AppState>) -> impl IntoResponse {
    let mut book = state.book.write().await;

    if !book.active {
        error!("No active interview in end_interview");
        return (
            StatusCode::BAD_REQUEST,
            Json(EndInterviewMessage {
                results: Some(Vec::new()),
                error: Some("No active session or answers available".to_string()),
            }),
        )
            .into_response();
    }

    let results = std::mem::take(&mut book.answers);
    book.active = false;
    info!(
        "Ending interview {}, {} answers",
        book.session_id,
        results.len()
    );

    (
        StatusCode::OK,
        Json(EndInterviewMessage {
            results: Some(results),
            error: None,
        }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
