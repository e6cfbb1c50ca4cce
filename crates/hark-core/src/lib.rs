pub mod backend;
pub mod chunk;
pub mod config;
pub mod errors;
pub mod events;
pub mod reduce;
pub mod types;

pub use backend::{AudioSink, ResultStream, SpeechBackend, SpeechSession};
pub use chunk::{Chunker, DEFAULT_CHUNK_SIZE};
pub use config::RecognizerConfig;
pub use errors::TranscribeError;
pub use events::TranscriptEvent;
pub use reduce::AggregateReducer;
pub use types::{Alternative, AudioChunk, RecognitionResult};
