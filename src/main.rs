use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use hark_core::config::RecognizerConfig;
use hark_server::{AppState, ServerConfig};
use hark_speech::TcpSpeechBackend;
use hark_store::AudioArchive;

/// HTTP front door for a remote streaming transcriber: uploads go in,
/// transcripts come back as one document or a live event feed.
#[derive(Parser, Debug)]
#[command(name = "hark", version, about)]
struct Args {
    /// Directory where uploaded audio is archived.
    output_dir: PathBuf,

    /// Port to listen on.
    #[arg(long, default_value_t = 7878)]
    port: u16,

    /// Address of the streaming transcriber.
    #[arg(long, default_value = "127.0.0.1:43007")]
    backend_addr: String,

    /// Recognizer resource to request.
    #[arg(long, default_value = "recognizers/_")]
    recognizer: String,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let archive = AudioArchive::new(&args.output_dir).expect("Failed to create output directory");
    tracing::info!(dir = %args.output_dir.display(), "audio archive ready");

    let backend = Arc::new(TcpSpeechBackend::new(&args.backend_addr));
    let state = AppState::new(
        backend,
        Arc::new(archive),
        RecognizerConfig::new(&args.recognizer),
    );

    let config = ServerConfig { port: args.port };
    let handle = hark_server::start(config, state)
        .await
        .expect("Failed to start server");

    tracing::info!(
        port = handle.port,
        backend = %args.backend_addr,
        "hark ready"
    );

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
}
