use std::sync::Arc;
use thiserror::Error;

use super::recorder::Recorder;
use crate::detection::FrameSource;

/// Failure to acquire or drive a capture stream
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user (or platform) refused camera/microphone access
    #[error("media access denied: {0}")]
    PermissionDenied(String),

    /// The stream exists but recording could not be started
    #[error("recorder failed: {0}")]
    Recorder(String),
}

/// Which tracks to request from the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// A binary fragment emitted by a recorder while it runs
#[derive(Debug, Clone)]
pub struct MediaChunk {
    /// Encoded media bytes
    pub data: Vec<u8>,
    /// Milliseconds since the recorder started
    pub timestamp_ms: u64,
}

/// Media capture capability
///
/// Implementations:
/// - `ReplayCapture`: replays a pre-recorded media file (local runs, demos)
/// - test doubles counting acquisitions and releases
#[async_trait::async_trait]
pub trait MediaCapture: Send + Sync {
    /// Request a live stream with the given tracks
    async fn acquire(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError>;

    /// Get capture name for logging
    fn name(&self) -> &str;
}

/// A live capture stream, exclusively owned by the session that acquired it
#[async_trait::async_trait]
pub trait MediaStream: Send {
    /// Start recording the stream
    ///
    /// The returned recorder yields chunks until it is stopped; its chunk
    /// channel closes once the last chunk has been delivered.
    async fn record(&mut self) -> Result<Recorder, CaptureError>;

    /// Video frames for preview and face detection
    fn frame_source(&self) -> Arc<dyn FrameSource>;

    /// Stop all underlying tracks
    fn release(&mut self);
}
