use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::backend::MediaChunk;

/// Default container produced by the recorders in this crate
pub const DEFAULT_MIME_TYPE: &str = "video/webm";

/// Handle to a running recorder
///
/// Chunks arrive on an internal channel. `stop()` asks the producer to flush
/// and finish; the channel closes once it has, which is the recorder's
/// completion signal.
pub struct Recorder {
    chunk_rx: mpsc::Receiver<MediaChunk>,
    stop_tx: Option<oneshot::Sender<()>>,
    mime_type: String,
}

impl Recorder {
    pub fn new(
        chunk_rx: mpsc::Receiver<MediaChunk>,
        stop_tx: oneshot::Sender<()>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            chunk_rx,
            stop_tx: Some(stop_tx),
            mime_type: mime_type.into(),
        }
    }

    /// Receive the next chunk, or `None` once the recorder has completed
    pub async fn next_chunk(&mut self) -> Option<MediaChunk> {
        self.chunk_rx.recv().await
    }

    /// Ask the producer to stop. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // The producer may already be gone; nothing left to stop then.
            let _ = tx.send(());
            debug!("Recorder stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_tx.is_none()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Stop and collect every chunk still in flight
    pub async fn finish(mut self) -> Vec<MediaChunk> {
        self.stop();
        let mut rest = Vec::new();
        while let Some(chunk) = self.chunk_rx.recv().await {
            rest.push(chunk);
        }
        rest
    }
}

/// The concatenated recording submitted as an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AnswerPayload {
    pub const FILE_NAME: &'static str = "answer.webm";

    /// Concatenate chunks in arrival order
    pub fn from_chunks(chunks: &[MediaChunk], mime_type: impl Into<String>) -> Self {
        let total: usize = chunks.iter().map(|c| c.data.len()).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk.data);
        }

        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: Self::FILE_NAME.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
