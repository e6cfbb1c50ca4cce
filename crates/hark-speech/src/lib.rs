pub mod mock;
pub mod tcp;

pub use mock::MockBackend;
pub use tcp::TcpSpeechBackend;
