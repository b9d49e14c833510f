//! Recording session control
//!
//! This module provides the `SessionController` that manages:
//! - Question display and progression
//! - Camera/microphone capture for one answer at a time
//! - The elapsed-time ceiling and face-presence policy
//! - Answer submission and feedback display

mod config;
mod controller;
mod session;
mod stats;

pub use config::SessionConfig;
pub use controller::{
    InterviewPhase, RecordingOutcome, SessionController, SessionError, SessionState,
    SubmissionOutcome, TerminationReason, NO_QUESTION,
};
pub use session::{Session, SessionEvent};
pub use stats::SessionStats;
