//! TCP client for a remote streaming transcriber.
//!
//! Wire protocol: one JSON config line, then raw audio bytes on the write
//! half; shutting down the write half signals that no more audio follows.
//! The transcriber answers with newline-delimited JSON results on the read
//! half and closes when recognition is complete.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio_stream::wrappers::LinesStream;
use tracing::debug;

use hark_core::backend::{AudioSink, SpeechBackend, SpeechSession};
use hark_core::config::RecognizerConfig;
use hark_core::errors::TranscribeError;
use hark_core::types::RecognitionResult;

/// Connects to a transcriber at a fixed address, one connection per
/// recognition stream.
pub struct TcpSpeechBackend {
    addr: String,
}

impl TcpSpeechBackend {
    pub fn new(addr: &str) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl SpeechBackend for TcpSpeechBackend {
    fn name(&self) -> &str {
        "tcp"
    }

    async fn open_stream(
        &self,
        config: &RecognizerConfig,
    ) -> Result<SpeechSession, TranscribeError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| TranscribeError::BackendOpen(format!("{}: {e}", self.addr)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TranscribeError::BackendOpen(e.to_string()))?;

        let (read_half, write_half) = stream.into_split();
        let mut sink = TcpAudioSink { writer: write_half };

        // Config travels first, before any audio frame.
        let mut line = serde_json::to_vec(config)
            .map_err(|e| TranscribeError::Serialization(e.to_string()))?;
        line.push(b'\n');
        sink.writer
            .write_all(&line)
            .await
            .map_err(|e| TranscribeError::BackendOpen(format!("config send: {e}")))?;

        debug!(addr = %self.addr, recognizer = %config.recognizer, "recognition stream open");

        let lines = LinesStream::new(BufReader::new(read_half).lines());
        let results = lines.filter_map(|item| {
            futures::future::ready(match item {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(
                    serde_json::from_str::<RecognitionResult>(&line).map_err(|e| {
                        TranscribeError::BackendRecv(format!("malformed result line: {e}"))
                    }),
                ),
                Err(e) => Some(Err(TranscribeError::BackendRecv(e.to_string()))),
            })
        });

        Ok(SpeechSession {
            audio: Box::new(sink),
            results: Box::pin(results),
        })
    }
}

struct TcpAudioSink {
    writer: OwnedWriteHalf,
}

#[async_trait]
impl AudioSink for TcpAudioSink {
    async fn send(&mut self, frame: Bytes) -> Result<(), TranscribeError> {
        self.writer
            .write_all(&frame)
            .await
            .map_err(|e| TranscribeError::BackendSend(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TranscribeError::BackendSend(e.to_string()))
    }

    async fn finish(self: Box<Self>) -> Result<(), TranscribeError> {
        // FIN on the write half; the read half stays open for results.
        let mut writer = self.writer;
        writer
            .shutdown()
            .await
            .map_err(|e| TranscribeError::BackendSend(e.to_string()))
    }
}
