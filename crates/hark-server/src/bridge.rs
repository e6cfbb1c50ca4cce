//! The streaming bridge: one recognition session per request, audio flowing
//! out while results flow back in.
//!
//! The send leg chunks the inbound body, appends every frame to the archive
//! file before forwarding it, and half-closes the session exactly once when
//! the body is exhausted. The receive leg forwards every
//! result in arrival order. The two legs run concurrently; the first error
//! from either cancels the other and becomes the request's error.

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use hark_core::backend::{SpeechBackend, SpeechSession};
use hark_core::chunk::Chunker;
use hark_core::config::RecognizerConfig;
use hark_core::errors::TranscribeError;
use hark_core::events::{ErrorInfo, TranscriptEvent};
use hark_core::reduce::AggregateReducer;
use hark_core::types::RecognitionResult;
use hark_store::AudioArchive;

/// Owns everything one request needs to reach the backend and the archive.
/// Ingestion is a parameter: a live request body (incremental mode) and a
/// fully-buffered upload wrapped in a one-item stream (buffered mode) both
/// run the identical bridge.
pub struct StreamBridge {
    backend: Arc<dyn SpeechBackend>,
    archive: Arc<AudioArchive>,
    config: RecognizerConfig,
    chunk_size: usize,
}

impl StreamBridge {
    pub fn new(
        backend: Arc<dyn SpeechBackend>,
        archive: Arc<AudioArchive>,
        config: RecognizerConfig,
        chunk_size: usize,
    ) -> Self {
        Self {
            backend,
            archive,
            config,
            chunk_size,
        }
    }

    /// Drive one session to joint completion, forwarding each result as a
    /// [`TranscriptEvent::Result`] on `events_tx`. Terminal events are the
    /// caller's concern; this only ever emits results.
    pub async fn run(
        &self,
        body: impl Stream<Item = Result<Bytes, TranscribeError>> + Send,
        events_tx: mpsc::UnboundedSender<TranscriptEvent>,
    ) -> Result<(), TranscribeError> {
        let SpeechSession { audio, results } = self.backend.open_stream(&self.config).await?;
        let file = self.archive.create().await?;

        let send_leg = async {
            let mut audio = audio;
            let mut file = file;
            let mut chunker = Chunker::new(self.chunk_size);
            let mut body = Box::pin(body);
            while let Some(read) = body.next().await {
                let data = read?;
                for frame in chunker.push(data) {
                    // Durable copy first: a frame never reaches the
                    // backend unless it is already on disk.
                    file.append(&frame.data).await?;
                    audio.send(frame.data).await?;
                }
            }
            audio.finish().await?;
            let archived = file.bytes_written();
            file.close().await?;
            Ok::<(u64, u64), TranscribeError>((chunker.frames_cut(), archived))
        };

        let recv_leg = async {
            let mut results = results;
            let mut forwarded = 0usize;
            while let Some(item) = results.next().await {
                let result = item?;
                if events_tx
                    .send(TranscriptEvent::Result { result })
                    .is_err()
                {
                    return Err(TranscribeError::Cancelled);
                }
                forwarded += 1;
            }
            Ok::<usize, TranscribeError>(forwarded)
        };

        let ((frames, archived), forwarded) = tokio::try_join!(send_leg, recv_leg)?;
        debug!(frames, archived, forwarded, "recognition session complete");
        Ok(())
    }

    /// Buffered/aggregate flavor: run the session to completion, then fold
    /// the result sequence down to the last final result.
    pub async fn run_aggregate(
        &self,
        body: impl Stream<Item = Result<Bytes, TranscribeError>> + Send,
    ) -> Result<RecognitionResult, TranscribeError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.run(body, tx).await?;

        let mut reducer = AggregateReducer::new();
        while let Some(event) = rx.recv().await {
            if let TranscriptEvent::Result { result } = event {
                reducer.observe(result);
            }
        }
        reducer.into_final().ok_or(TranscribeError::NoFinalResult)
    }

    /// Live flavor: run the session, then append exactly one terminal
    /// event, `Done` on clean completion and `Error` otherwise. Send
    /// failures are
    /// ignored; they mean the client is already gone.
    pub async fn run_live(
        &self,
        body: impl Stream<Item = Result<Bytes, TranscribeError>> + Send,
        events_tx: mpsc::UnboundedSender<TranscriptEvent>,
    ) {
        match self.run(body, events_tx.clone()).await {
            Ok(()) => {
                let _ = events_tx.send(TranscriptEvent::Done);
            }
            Err(error) => {
                warn!(kind = error.error_kind(), error = %error, "live recognition failed");
                let _ = events_tx.send(TranscriptEvent::Error {
                    error: ErrorInfo::from(&error),
                });
            }
        }
    }
}
