use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use super::monitor::{DetectionError, FaceMonitor, FrameSource};

/// One scripted detector answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedSample {
    Faces(usize),
    Fail(String),
}

/// Face monitor that replays a fixed sequence of answers
///
/// The last answer repeats once the script is exhausted. An empty script
/// always reports one face.
pub struct ScriptedFaceMonitor {
    script: Mutex<VecDeque<ScriptedSample>>,
    last: Mutex<ScriptedSample>,
    load_error: Option<String>,
}

impl ScriptedFaceMonitor {
    pub fn new(script: impl IntoIterator<Item = ScriptedSample>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(ScriptedSample::Faces(1)),
            load_error: None,
        }
    }

    pub fn from_counts(counts: impl IntoIterator<Item = usize>) -> Self {
        Self::new(counts.into_iter().map(ScriptedSample::Faces))
    }

    /// Parse a comma-separated list such as `1,1,0` (`e` marks a failed sample)
    pub fn parse(script: &str) -> anyhow::Result<Self> {
        let samples = script
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "e" | "err" => Ok(ScriptedSample::Fail("scripted failure".to_string())),
                n => n
                    .parse::<usize>()
                    .map(ScriptedSample::Faces)
                    .map_err(|e| anyhow::anyhow!("invalid face count '{}': {}", n, e)),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self::new(samples))
    }

    /// Make `load()` fail with the given message
    pub fn failing_load(mut self, message: impl Into<String>) -> Self {
        self.load_error = Some(message.into());
        self
    }

    fn next_sample(&self) -> ScriptedSample {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = script.pop_front() {
            *last = next;
        }
        last.clone()
    }
}

#[async_trait::async_trait]
impl FaceMonitor for ScriptedFaceMonitor {
    async fn load(&self) -> Result<(), DetectionError> {
        match &self.load_error {
            Some(message) => Err(DetectionError::ModelLoad(message.clone())),
            None => Ok(()),
        }
    }

    async fn sample(
        &self,
        _frames: &dyn FrameSource,
        timestamp_ms: i64,
    ) -> Result<usize, DetectionError> {
        let sample = self.next_sample();
        debug!("Scripted face sample at {}: {:?}", timestamp_ms, sample);
        match sample {
            ScriptedSample::Faces(n) => Ok(n),
            ScriptedSample::Fail(message) => Err(DetectionError::Inference(message)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
