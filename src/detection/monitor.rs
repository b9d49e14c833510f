use thiserror::Error;

/// Face detection failures
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The model could not be initialised; detection stays off for good
    #[error("face detection model failed to load: {0}")]
    ModelLoad(String),

    /// A single inference failed; the sample is skipped
    #[error("face detection failed: {0}")]
    Inference(String),
}

/// Something that can hand video frames to a detector
pub trait FrameSource: Send + Sync {
    /// True once the first decodable frame is available
    fn is_ready(&self) -> bool;
}

/// Face detection capability
#[async_trait::async_trait]
pub trait FaceMonitor: Send + Sync {
    /// Initialise the model
    async fn load(&self) -> Result<(), DetectionError>;

    /// Count the faces in the current frame
    ///
    /// Callers only sample ready frame sources.
    async fn sample(
        &self,
        frames: &dyn FrameSource,
        timestamp_ms: i64,
    ) -> Result<usize, DetectionError>;

    /// Get monitor name for logging
    fn name(&self) -> &str;
}

/// Why the face policy stopped the interview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceViolation {
    NoFace,
    MultipleFaces(usize),
}

/// Exactly one face must be visible
pub fn check_face_count(face_count: usize) -> Option<FaceViolation> {
    match face_count {
        0 => Some(FaceViolation::NoFace),
        1 => None,
        n => Some(FaceViolation::MultipleFaces(n)),
    }
}
