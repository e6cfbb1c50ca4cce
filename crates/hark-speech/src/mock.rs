use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};

use hark_core::backend::{AudioSink, SpeechBackend, SpeechSession};
use hark_core::config::RecognizerConfig;
use hark_core::errors::TranscribeError;
use hark_core::types::RecognitionResult;

/// Pre-programmed backend for deterministic testing without a transcriber.
///
/// Every session yields the scripted result sequence and records the audio
/// frames it is sent, so tests can assert on exactly what crossed the seam.
pub struct MockBackend {
    script: Vec<Result<RecognitionResult, TranscribeError>>,
    open_error: Option<TranscribeError>,
    send_failure: Option<(usize, TranscribeError)>,
    result_delay: Option<Duration>,
    open_count: AtomicUsize,
    finish_count: Arc<AtomicUsize>,
    frames: Arc<Mutex<Vec<Bytes>>>,
    configs: Arc<Mutex<Vec<RecognizerConfig>>>,
}

impl MockBackend {
    pub fn new(script: Vec<Result<RecognitionResult, TranscribeError>>) -> Self {
        Self {
            script,
            open_error: None,
            send_failure: None,
            result_delay: None,
            open_count: AtomicUsize::new(0),
            finish_count: Arc::new(AtomicUsize::new(0)),
            frames: Arc::new(Mutex::new(Vec::new())),
            configs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: a script of partials followed by one final result.
    pub fn scripted_transcript(partials: &[&str], final_text: &str) -> Self {
        let mut script: Vec<Result<RecognitionResult, TranscribeError>> = partials
            .iter()
            .map(|text| Ok(RecognitionResult::partial_text(text, 0.4)))
            .collect();
        script.push(Ok(RecognitionResult::final_text(final_text, 0.95)));
        Self::new(script)
    }

    /// Fail `open_stream` itself.
    pub fn with_open_error(error: TranscribeError) -> Self {
        let mut mock = Self::new(vec![]);
        mock.open_error = Some(error);
        mock
    }

    /// Fail the Nth `send` call (0-based) with `error`.
    pub fn failing_send_at(mut self, frame_index: usize, error: TranscribeError) -> Self {
        self.send_failure = Some((frame_index, error));
        self
    }

    /// Delay each scripted result, to exercise out-of-phase arrival.
    pub fn with_result_delay(mut self, delay: Duration) -> Self {
        self.result_delay = Some(delay);
        self
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::Relaxed)
    }

    pub fn finish_count(&self) -> usize {
        self.finish_count.load(Ordering::Relaxed)
    }

    /// Every audio frame sent across all sessions, in send order.
    pub fn sent_frames(&self) -> Vec<Bytes> {
        self.frames.lock().unwrap().clone()
    }

    pub fn sent_bytes(&self) -> usize {
        self.frames.lock().unwrap().iter().map(|f| f.len()).sum()
    }

    /// Configs delivered at stream open, in open order.
    pub fn seen_configs(&self) -> Vec<RecognizerConfig> {
        self.configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open_stream(
        &self,
        config: &RecognizerConfig,
    ) -> Result<SpeechSession, TranscribeError> {
        self.open_count.fetch_add(1, Ordering::Relaxed);
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        self.configs.lock().unwrap().push(config.clone());

        let sink = MockSink {
            frames: Arc::clone(&self.frames),
            finish_count: Arc::clone(&self.finish_count),
            send_failure: self.send_failure.clone(),
            sent: 0,
        };

        let delay = self.result_delay;
        let results = stream::iter(self.script.clone()).then(move |item| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            item
        });

        Ok(SpeechSession {
            audio: Box::new(sink),
            results: Box::pin(results),
        })
    }
}

struct MockSink {
    frames: Arc<Mutex<Vec<Bytes>>>,
    finish_count: Arc<AtomicUsize>,
    send_failure: Option<(usize, TranscribeError)>,
    sent: usize,
}

#[async_trait]
impl AudioSink for MockSink {
    async fn send(&mut self, frame: Bytes) -> Result<(), TranscribeError> {
        if let Some((index, error)) = &self.send_failure {
            if self.sent == *index {
                return Err(error.clone());
            }
        }
        self.sent += 1;
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<(), TranscribeError> {
        self.finish_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
