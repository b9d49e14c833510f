pub mod backend;
pub mod recorder;
pub mod replay;

pub use backend::{CaptureConstraints, CaptureError, MediaCapture, MediaChunk, MediaStream};
pub use recorder::{AnswerPayload, Recorder, DEFAULT_MIME_TYPE};
pub use replay::{ReplayCapture, ReplayConfig, ReplayFrames};
