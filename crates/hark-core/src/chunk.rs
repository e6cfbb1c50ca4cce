use bytes::Bytes;

use crate::types::AudioChunk;

/// Frame size used for backend streaming, matching what the recognizer
/// expects per request frame.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Splits an arbitrary byte flow into sequence-numbered frames of at most
/// `max` bytes each, preserving byte order.
///
/// Splitting is purely length-based; frame boundaries carry no meaning to
/// the audio format. Each `push` yields the frames cut from that input;
/// an empty input yields no frames. Incoming buffers shorter than `max`
/// pass through as a single frame; buffers are never coalesced across
/// pushes.
#[derive(Debug)]
pub struct Chunker {
    max: usize,
    next_seq: u64,
}

impl Chunker {
    pub fn new(max: usize) -> Self {
        assert!(max > 0, "chunk size must be non-zero");
        Self { max, next_seq: 0 }
    }

    /// Cut `data` into frames of at most `max` bytes.
    ///
    /// `Bytes::slice` is cheap here: frames share the input buffer rather
    /// than copying it.
    pub fn push(&mut self, data: Bytes) -> Vec<AudioChunk> {
        let mut frames = Vec::with_capacity(data.len().div_ceil(self.max));
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + self.max).min(data.len());
            frames.push(AudioChunk {
                seq: self.next_seq,
                data: data.slice(offset..end),
            });
            self.next_seq += 1;
            offset = end;
        }
        frames
    }

    /// Frames produced so far.
    pub fn frames_cut(&self) -> u64 {
        self.next_seq
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
