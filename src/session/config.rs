use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::InterviewConfig;

/// Configuration for the session controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Recording is terminated once elapsed time exceeds this many seconds
    /// Default: 60
    pub max_recording_secs: u32,

    /// Period of the elapsed-time ticker
    pub tick_interval: Duration,

    /// Period of the face-presence check
    pub detection_interval: Duration,

    /// Feedback containing this token counts as a perfect score
    pub perfect_score_marker: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_recording_secs: 60,
            tick_interval: Duration::from_secs(1),
            detection_interval: Duration::from_millis(500),
            perfect_score_marker: "10/10".to_string(),
        }
    }
}

impl From<&InterviewConfig> for SessionConfig {
    fn from(cfg: &InterviewConfig) -> Self {
        Self {
            max_recording_secs: cfg.max_recording_secs,
            tick_interval: Duration::from_millis(cfg.tick_interval_ms),
            detection_interval: Duration::from_millis(cfg.detection_interval_ms),
            perfect_score_marker: cfg.perfect_score_marker.clone(),
        }
    }
}
