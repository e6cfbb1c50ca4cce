pub mod bridge;
pub mod handlers;
pub mod server;
pub mod sse;

pub use bridge::StreamBridge;
pub use server::{start, AppState, ServerConfig, ServerHandle};
