//! What the interview page shows
//!
//! The controller never touches a page directly. It emits `PageUpdate`s into
//! an `InterviewView`, which may be a terminal, a web front-end bridge or a
//! test recorder.

mod console;

pub use console::ConsoleView;

use std::fmt;

/// Blocking notices the user has to acknowledge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PermissionDenied,
    NoFace,
    MultipleFaces,
    Timeout { limit_secs: u32 },
    DetectionUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PermissionDenied => {
                write!(f, "Please allow microphone and camera access for the live interview.")
            }
            Notice::NoFace => write!(f, "No face detected. Interview stopped."),
            Notice::MultipleFaces => write!(
                f,
                "Multiple faces detected. Only one person allowed. Interview stopped."
            ),
            Notice::Timeout { limit_secs } => write!(
                f,
                "Recording time exceeded {} seconds. Interview stopped.",
                limit_secs
            ),
            Notice::DetectionUnavailable => write!(
                f,
                "Failed to load face detection model. Face detection will be disabled."
            ),
        }
    }
}

/// A single change to the page
#[derive(Debug, Clone, PartialEq)]
pub enum PageUpdate {
    /// Question heading (question, error or end-of-interview line)
    QuestionText(String),
    /// Progress bar, 0..=100
    Progress(f64),
    /// Recording timer in seconds
    Timer(u32),
    /// Record button and webcam preview
    Recording(bool),
    Transcript(String),
    Feedback(String),
    /// Perfect-score celebration
    Celebrate,
    NextEnabled(bool),
    Notice(Notice),
}

/// Sink for page updates
pub trait InterviewView: Send + Sync {
    fn render(&self, update: PageUpdate);
}
