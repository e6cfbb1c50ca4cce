use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::config::RecognizerConfig;
use crate::errors::TranscribeError;
use crate::types::RecognitionResult;

/// Inbound half of an open recognition exchange. Ends cleanly (stream
/// exhaustion) when the backend signals end-of-stream.
pub type ResultStream =
    Pin<Box<dyn Stream<Item = Result<RecognitionResult, TranscribeError>> + Send>>;

/// Outbound half of an open recognition exchange.
///
/// `finish` consumes the sink, so sending a frame after the half-close is
/// not representable.
#[async_trait]
pub trait AudioSink: Send {
    /// Send one audio frame, preserving call order on the wire.
    async fn send(&mut self, frame: Bytes) -> Result<(), TranscribeError>;

    /// Half-close: signal that no more audio follows. The result stream
    /// is still expected to drain to its end afterwards.
    async fn finish(self: Box<Self>) -> Result<(), TranscribeError>;
}

/// One open bidirectional exchange with the transcription backend. At most
/// one exists per client request; both halves are owned by that request's
/// bridge and dropped when it completes.
pub struct SpeechSession {
    pub audio: Box<dyn AudioSink>,
    pub results: ResultStream,
}

/// The transcription backend seam. Implementations own connection details;
/// callers only ever see sessions.
///
/// Constructed once at startup and passed into each request's bridge,
/// never reached through ambient global state.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Open a recognition stream, delivering `config` to the backend
    /// before any audio.
    async fn open_stream(
        &self,
        config: &RecognizerConfig,
    ) -> Result<SpeechSession, TranscribeError>;
}
