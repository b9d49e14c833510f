use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::backend::{CaptureConstraints, CaptureError, MediaCapture, MediaChunk, MediaStream};
use super::recorder::{Recorder, DEFAULT_MIME_TYPE};
use crate::detection::FrameSource;

/// Replay settings
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Pre-recorded media file standing in for the camera
    pub path: PathBuf,
    /// Bytes per emitted chunk
    pub chunk_bytes: usize,
    /// Delay between chunks
    pub chunk_interval: Duration,
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_bytes: 16 * 1024,
            chunk_interval: Duration::from_millis(250),
        }
    }
}

/// Capture that replays a media file as if it were a live camera
///
/// The file is read on `acquire`; an unreadable file is reported the same way
/// a browser reports a refused camera.
pub struct ReplayCapture {
    config: ReplayConfig,
}

impl ReplayCapture {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

#[async_trait::async_trait]
impl MediaCapture for ReplayCapture {
    async fn acquire(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError> {
        info!(
            "Opening replay media: {} (audio={}, video={})",
            self.config.path.display(),
            constraints.audio,
            constraints.video
        );

        let data = tokio::fs::read(&self.config.path).await.map_err(|e| {
            CaptureError::PermissionDenied(format!("{}: {}", self.config.path.display(), e))
        })?;

        if data.is_empty() {
            return Err(CaptureError::PermissionDenied(format!(
                "{}: no media data",
                self.config.path.display()
            )));
        }

        info!("Replay media loaded: {} bytes", data.len());

        Ok(Box::new(ReplayStream {
            data: Arc::new(data),
            chunk_bytes: self.config.chunk_bytes.max(1),
            chunk_interval: self.config.chunk_interval,
            frames: Arc::new(ReplayFrames::default()),
            live: Arc::new(AtomicBool::new(true)),
        }))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

/// Becomes ready once the first chunk has been produced
#[derive(Debug, Default)]
pub struct ReplayFrames {
    ready: AtomicBool,
}

impl FrameSource for ReplayFrames {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

struct ReplayStream {
    data: Arc<Vec<u8>>,
    chunk_bytes: usize,
    chunk_interval: Duration,
    frames: Arc<ReplayFrames>,
    live: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl MediaStream for ReplayStream {
    async fn record(&mut self) -> Result<Recorder, CaptureError> {
        if !self.live.load(Ordering::SeqCst) {
            return Err(CaptureError::Recorder("stream already released".to_string()));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let data = Arc::clone(&self.data);
        let frames = Arc::clone(&self.frames);
        let live = Arc::clone(&self.live);
        let chunk_bytes = self.chunk_bytes;
        let chunk_interval = self.chunk_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(chunk_interval);
            let mut offset = 0usize;
            let mut timestamp_ms = 0u64;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }

                if !live.load(Ordering::SeqCst) {
                    break;
                }

                // Wrap around so the "camera" never runs dry
                if offset >= data.len() {
                    offset = 0;
                }
                let end = (offset + chunk_bytes).min(data.len());
                let chunk = MediaChunk {
                    data: data[offset..end].to_vec(),
                    timestamp_ms,
                };
                offset = end;
                timestamp_ms += chunk_interval.as_millis() as u64;

                if chunk_tx.send(chunk).await.is_err() {
                    warn!("Replay recorder receiver dropped");
                    break;
                }
                frames.ready.store(true, Ordering::SeqCst);
            }

            info!("Replay recorder finished");
        });

        Ok(Recorder::new(chunk_rx, stop_tx, DEFAULT_MIME_TYPE))
    }

    fn frame_source(&self) -> Arc<dyn FrameSource> {
        self.frames.clone()
    }

    fn release(&mut self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.frames.ready.store(false, Ordering::SeqCst);
            info!("Replay stream released");
        }
    }
}
