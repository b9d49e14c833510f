use chrono::{DateTime, Utc};
use serde::Serialize;

use super::controller::SessionState;

/// Snapshot of the controller and its active recording
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub state: SessionState,

    /// Whether a recording is currently active
    pub is_recording: bool,

    /// When the active recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds counted by the ticker so far
    pub elapsed_secs: u32,

    /// Number of media chunks received so far
    pub chunks_count: usize,

    pub bytes_recorded: usize,
}
