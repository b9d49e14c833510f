//! Face presence detection
//!
//! The detector itself is an external capability behind `FaceMonitor`; this
//! module owns the one-face policy applied to its answers.

pub mod monitor;
pub mod scripted;

pub use monitor::{check_face_count, DetectionError, FaceMonitor, FaceViolation, FrameSource};
pub use scripted::{ScriptedFaceMonitor, ScriptedSample};
