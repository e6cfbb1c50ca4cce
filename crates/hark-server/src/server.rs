use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use hark_core::backend::SpeechBackend;
use hark_core::chunk::DEFAULT_CHUNK_SIZE;
use hark_core::config::RecognizerConfig;
use hark_store::AudioArchive;

use crate::bridge::StreamBridge;
use crate::handlers;

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 7878 }
    }
}

/// Shared application state passed to Axum handlers. The backend client is
/// built once at startup and handed to every request's bridge explicitly.
#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn SpeechBackend>,
    archive: Arc<AudioArchive>,
    recognizer: RecognizerConfig,
    chunk_size: usize,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn SpeechBackend>,
        archive: Arc<AudioArchive>,
        recognizer: RecognizerConfig,
    ) -> Self {
        Self {
            backend,
            archive,
            recognizer,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// A fresh bridge for one request.
    pub(crate) fn bridge(&self) -> StreamBridge {
        StreamBridge::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.archive),
            self.recognizer.clone(),
            self.chunk_size,
        )
    }
}

/// Build the Axum router with both upload routes. The body limit is lifted:
/// uploads are raw audio of arbitrary size.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::transcribe_batch))
        .route("/stream", post(handlers::transcribe_stream))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and start serving. Port 0 picks a free port; the bound port is on
/// the returned handle.
pub async fn start(config: ServerConfig, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "hark server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server,
    })
}

/// Handle returned by `start()`. Keeps the accept loop alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hark_core::errors::TranscribeError;
    use hark_core::types::RecognitionResult;
    use hark_speech::MockBackend;

    struct TestServer {
        handle: ServerHandle,
        backend: Arc<MockBackend>,
        dir: tempfile::TempDir,
    }

    impl TestServer {
        fn url(&self, path: &str) -> String {
            format!("http://127.0.0.1:{}{path}", self.handle.port)
        }
    }

    async fn start_with(backend: MockBackend) -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let archive = Arc::new(AudioArchive::new(dir.path()).unwrap());
        let backend = Arc::new(backend);
        let state = AppState::new(
            Arc::clone(&backend) as Arc<dyn SpeechBackend>,
            archive,
            RecognizerConfig::default(),
        );
        let handle = start(ServerConfig { port: 0 }, state).await.unwrap();
        TestServer {
            handle,
            backend,
            dir,
        }
    }

    #[tokio::test]
    async fn batch_upload_round_trips_to_aggregate_text() {
        let server = start_with(MockBackend::scripted_transcript(
            &["turn", "turn it"],
            "turn it up",
        ))
        .await;

        let resp = reqwest::Client::new()
            .post(server.url("/"))
            .body(vec![0x42u8; 20_000])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "text": "turn it up" }));

        // Chunked exactly as the backend expects, one durable file on disk.
        let sizes: Vec<usize> = server
            .backend
            .sent_frames()
            .iter()
            .map(|f| f.len())
            .collect();
        assert_eq!(sizes, vec![8192, 8192, 3616]);

        let files: Vec<_> = std::fs::read_dir(server.dir.path())
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].metadata().unwrap().len(), 20_000);
    }

    #[tokio::test]
    async fn batch_without_final_result_is_500_not_empty_success() {
        let server = start_with(MockBackend::new(vec![
            Ok(RecognitionResult::partial_text("mumble", 0.2)),
        ]))
        .await;

        let resp = reqwest::Client::new()
            .post(server.url("/"))
            .body(b"audio".to_vec())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        assert!(resp.text().await.unwrap().contains("no final result"));
    }

    #[tokio::test]
    async fn backend_open_failure_maps_to_502() {
        let server = start_with(MockBackend::with_open_error(TranscribeError::BackendOpen(
            "connection refused".into(),
        )))
        .await;

        let resp = reqwest::Client::new()
            .post(server.url("/"))
            .body(b"audio".to_vec())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
    }

    #[tokio::test]
    async fn stream_upload_emits_events_then_done() {
        let server =
            start_with(MockBackend::scripted_transcript(&["hel", "hello"], "hello world")).await;

        let resp = reqwest::Client::new()
            .post(server.url("/stream"))
            .body(vec![0x13u8; 10_000])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()
                .get(reqwest::header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap(),
            "text/event-stream"
        );
        assert_eq!(
            resp.headers().get("x-accel-buffering").unwrap(),
            "no"
        );

        let text = resp.text().await.unwrap();
        let result_lines: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("data: ") && l.contains("\"result\""))
            .collect();
        assert_eq!(result_lines.len(), 3);

        // Order and flags survive the wire.
        let first: serde_json::Value =
            serde_json::from_str(result_lines[0].trim_start_matches("data: ")).unwrap();
        assert_eq!(first["isFinal"], serde_json::json!(false));
        let last: serde_json::Value =
            serde_json::from_str(result_lines[2].trim_start_matches("data: ")).unwrap();
        assert_eq!(last["isFinal"], serde_json::json!(true));

        let done_pos = text.find("event: done").expect("missing done event");
        assert!(result_lines
            .iter()
            .all(|line| text.find(*line).unwrap() < done_pos));
        assert!(!text.contains("event: error"));
    }

    #[tokio::test]
    async fn stream_error_after_results_ends_feed_without_done() {
        let server = start_with(MockBackend::new(vec![
            Ok(RecognitionResult::partial_text("a", 0.2)),
            Ok(RecognitionResult::partial_text("ab", 0.3)),
            Err(TranscribeError::BackendRecv("stream reset".into())),
        ]))
        .await;

        let resp = reqwest::Client::new()
            .post(server.url("/stream"))
            .body(b"audio".to_vec())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let text = resp.text().await.unwrap();
        let result_lines = text
            .lines()
            .filter(|l| l.starts_with("data: ") && l.contains("\"result\""))
            .count();
        assert_eq!(result_lines, 2);
        assert!(text.contains("event: error"));
        assert!(text.contains("backend_recv"));
        assert!(!text.contains("event: done"));
    }

    #[tokio::test]
    async fn stream_with_json_accept_returns_aggregate_document() {
        let server = start_with(MockBackend::scripted_transcript(&["so"], "so it goes")).await;

        let resp = reqwest::Client::new()
            .post(server.url("/stream"))
            .header(reqwest::header::ACCEPT, "application/json")
            .body(vec![0u8; 100])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "text": "so it goes" }));
    }

    #[tokio::test]
    async fn empty_upload_still_runs_a_session() {
        let server = start_with(MockBackend::scripted_transcript(&[], "silence")).await;

        let resp = reqwest::Client::new()
            .post(server.url("/"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        assert_eq!(server.backend.open_count(), 1);
        assert_eq!(server.backend.finish_count(), 1);
        assert!(server.backend.sent_frames().is_empty());
    }
}
