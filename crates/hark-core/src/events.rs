use serde::{Deserialize, Serialize};

use crate::errors::TranscribeError;
use crate::types::RecognitionResult;

/// Events emitted on the live response feed. Ordering contract:
///
/// Result* → (Done | Error)
///
/// Nothing follows a terminal event.
#[derive(Clone, Debug, PartialEq)]
pub enum TranscriptEvent {
    Result { result: RecognitionResult },
    Done,
    Error { error: ErrorInfo },
}

/// Lightweight error payload for the wire (kind string + message).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl From<&TranscribeError> for ErrorInfo {
    fn from(e: &TranscribeError) -> Self {
        Self {
            kind: e.error_kind().to_string(),
            message: e.to_string(),
        }
    }
}

impl TranscriptEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}
