//! Rehearsal question server
//!
//! This module serves a canned interview over the same REST API the session
//! controller talks to:
//! - POST /start_interview - Start over with the configured questions
//! - GET /check_questions - Questions of the active interview
//! - GET /get_current_question - Current question, end marker or error
//! - GET /next_question - Advance and return the new current question
//! - POST /process_audio - Evaluate a recorded answer (multipart)
//! - GET /end_interview - Collected answers; closes the interview
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AnswerEvaluator, AppState, CannedEvaluator, Evaluation, InterviewBook};
