use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One bounded frame of audio cut from the upload, in source order.
///
/// Created by the [`Chunker`](crate::chunk::Chunker), written once to the
/// archive, sent once to the backend, then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioChunk {
    /// Ordinal position in the source stream, starting at 0.
    pub seq: u64,
    pub data: Bytes,
}

impl AudioChunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single transcription hypothesis with its confidence score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    #[serde(default)]
    pub confidence: f32,
}

/// One recognition result from the backend, partial or final.
///
/// Alternatives are ordered by confidence, best first. Immutable once
/// received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub is_final: bool,
}

impl RecognitionResult {
    /// Text of the best alternative, or empty if the backend sent none.
    pub fn top_transcript(&self) -> &str {
        self.alternatives
            .first()
            .map(|a| a.transcript.as_str())
            .unwrap_or("")
    }

    /// Convenience constructor for a final result with one alternative.
    pub fn final_text(transcript: &str, confidence: f32) -> Self {
        Self {
            alternatives: vec![Alternative {
                transcript: transcript.into(),
                confidence,
            }],
            is_final: true,
        }
    }

    /// Convenience constructor for a partial result with one alternative.
    pub fn partial_text(transcript: &str, confidence: f32) -> Self {
        Self {
            alternatives: vec![Alternative {
                transcript: transcript.into(),
                confidence,
            }],
            is_final: false,
        }
    }
}
