use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use crate::capture::{AnswerPayload, MediaChunk, MediaStream, Recorder};
use crate::detection::{DetectionError, FaceMonitor, FrameSource};

/// Input to the controller while a recording is active
#[derive(Debug)]
pub enum SessionEvent {
    /// One tick of the elapsed-time ticker
    Tick,
    /// One face-detection answer
    Sample(Result<usize, DetectionError>),
    /// Recorded media
    Chunk(MediaChunk),
}

enum Polled {
    Event(Option<SessionEvent>),
    Chunk(Option<MediaChunk>),
}

/// One recording attempt
///
/// Owns the capture stream, the recorder and both producer tasks. It is built
/// when recording starts and consumed by `finish` or `discard`; dropping it
/// releases whatever is still held.
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
    clock: Instant,
    elapsed_secs: u32,
    chunks: Vec<MediaChunk>,
    bytes_recorded: usize,
    stream: Option<Box<dyn MediaStream>>,
    recorder: Option<Recorder>,
    recorder_open: bool,
    events_rx: mpsc::Receiver<SessionEvent>,
    producers: Vec<JoinHandle<()>>,
}

impl Session {
    /// Take ownership of a recording stream and start the producers
    ///
    /// The face sampler only runs when a loaded monitor is supplied.
    pub fn begin(
        stream: Box<dyn MediaStream>,
        recorder: Recorder,
        config: &SessionConfig,
        monitor: Option<Arc<dyn FaceMonitor>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);

        let mut producers = vec![spawn_ticker(events_tx.clone(), config.tick_interval)];
        if let Some(monitor) = monitor {
            producers.push(spawn_sampler(
                events_tx,
                monitor,
                stream.frame_source(),
                config.detection_interval,
            ));
        }

        Self {
            id: format!("answer-{}", uuid::Uuid::new_v4()),
            started_at: Utc::now(),
            clock: Instant::now(),
            elapsed_secs: 0,
            chunks: Vec::new(),
            bytes_recorded: 0,
            stream: Some(stream),
            recorder: Some(recorder),
            recorder_open: true,
            events_rx,
            producers,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn chunks_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn bytes_recorded(&self) -> usize {
        self.bytes_recorded
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Wait for the next tick, sample or chunk
    ///
    /// Returns `None` once every producer has gone away.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            let polled = match self.recorder.as_mut() {
                Some(recorder) if self.recorder_open => tokio::select! {
                    event = self.events_rx.recv() => Polled::Event(event),
                    chunk = recorder.next_chunk() => Polled::Chunk(chunk),
                },
                _ => Polled::Event(self.events_rx.recv().await),
            };

            match polled {
                Polled::Event(event) => return event,
                Polled::Chunk(Some(chunk)) => return Some(SessionEvent::Chunk(chunk)),
                Polled::Chunk(None) => {
                    debug!("Recorder for {} completed early", self.id);
                    self.recorder_open = false;
                }
            }
        }
    }

    /// An event the producers have already queued, without waiting
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Whole seconds since the recording began, whatever the ticker delivered
    pub fn running_secs(&self) -> u64 {
        self.clock.elapsed().as_secs()
    }

    /// Count one more second
    pub fn tick(&mut self) -> u32 {
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        self.elapsed_secs
    }

    pub fn record_chunk(&mut self, chunk: MediaChunk) {
        self.bytes_recorded += chunk.data.len();
        self.chunks.push(chunk);
    }

    /// Normal stop: collect the remaining media and release the stream
    pub async fn finish(mut self) -> AnswerPayload {
        self.join_producers().await;

        let mime_type = self
            .recorder
            .as_ref()
            .map(|r| r.mime_type().to_string())
            .unwrap_or_else(|| crate::capture::DEFAULT_MIME_TYPE.to_string());

        if let Some(recorder) = self.recorder.take() {
            for chunk in recorder.finish().await {
                self.record_chunk(chunk);
            }
        }
        self.release_stream();

        info!(
            "Recording {} finished: {}s, {} chunks, {} bytes",
            self.id,
            self.elapsed_secs,
            self.chunks.len(),
            self.bytes_recorded
        );

        AnswerPayload::from_chunks(&std::mem::take(&mut self.chunks), mime_type)
    }

    /// Forced stop: drop the media and release the stream
    pub async fn discard(mut self) {
        self.join_producers().await;
        self.shutdown();
        info!(
            "Recording {} discarded after {}s ({} chunks dropped)",
            self.id,
            self.elapsed_secs,
            self.chunks.len()
        );
        self.chunks.clear();
    }

    /// Abort the producers and wait until none of them is running
    async fn join_producers(&mut self) {
        let producers: Vec<_> = self.producers.drain(..).collect();
        for producer in &producers {
            producer.abort();
        }
        for producer in producers {
            if let Err(e) = producer.await {
                if !e.is_cancelled() {
                    warn!("Producer for {} failed: {}", self.id, e);
                }
            }
        }
    }

    fn halt_producers(&mut self) {
        for producer in self.producers.drain(..) {
            producer.abort();
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            debug!("Capture stream for {} released", self.id);
        }
    }

    /// Producers first, then the recorder, then the stream
    fn shutdown(&mut self) {
        self.halt_producers();
        if let Some(mut recorder) = self.recorder.take() {
            recorder.stop();
        }
        self.release_stream();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_ticker(events_tx: mpsc::Sender<SessionEvent>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if events_tx.send(SessionEvent::Tick).await.is_err() {
                break;
            }
        }
    })
}

fn spawn_sampler(
    events_tx: mpsc::Sender<SessionEvent>,
    monitor: Arc<dyn FaceMonitor>,
    frames: Arc<dyn FrameSource>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if !frames.is_ready() {
                debug!("No decodable frame yet, skipping face sample");
                continue;
            }

            let result = monitor
                .sample(frames.as_ref(), Utc::now().timestamp_millis())
                .await;
            if events_tx.send(SessionEvent::Sample(result)).await.is_err() {
                break;
            }
        }
    })
}
