/// Typed error hierarchy for one transcription request.
/// Every variant surfaces to the client; nothing is silently swallowed.
#[derive(Clone, Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("failed to read request body: {0}")]
    InputRead(String),

    #[error("failed to write audio to archive: {0}")]
    StorageWrite(String),

    #[error("failed to open recognition stream: {0}")]
    BackendOpen(String),

    #[error("failed to send audio to backend: {0}")]
    BackendSend(String),

    #[error("failed to receive recognition result: {0}")]
    BackendRecv(String),

    #[error("recognition produced no final result")]
    NoFinalResult,

    #[error("failed to serialize result: {0}")]
    Serialization(String),

    #[error("client disconnected")]
    Cancelled,
}

impl TranscribeError {
    /// Short classification string for logging and error events.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::InputRead(_) => "input_read",
            Self::StorageWrite(_) => "storage_write",
            Self::BackendOpen(_) => "backend_open",
            Self::BackendSend(_) => "backend_send",
            Self::BackendRecv(_) => "backend_recv",
            Self::NoFinalResult => "no_final_result",
            Self::Serialization(_) => "serialization",
            Self::Cancelled => "cancelled",
        }
    }

    /// HTTP status used when the error arrives before any response bytes
    /// are committed. Once a live feed has started, errors travel in-band
    /// instead.
    pub fn status(&self) -> u16 {
        match self {
            Self::InputRead(_) => 400,
            Self::BackendOpen(_) | Self::BackendSend(_) | Self::BackendRecv(_) => 502,
            Self::StorageWrite(_)
            | Self::NoFinalResult
            | Self::Serialization(_)
            | Self::Cancelled => 500,
        }
    }
}
