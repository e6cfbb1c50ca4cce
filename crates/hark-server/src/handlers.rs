//! Request handlers for the two upload endpoints.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::{stream, Stream, TryStreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use hark_core::errors::TranscribeError;
use hark_core::types::RecognitionResult;

use crate::server::AppState;
use crate::sse;

/// `POST /`: buffer the whole upload, then run it through the bridge and
/// answer with the reduced transcript.
pub async fn transcribe_batch(State(state): State<AppState>, body: Body) -> Response {
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => return error_response(TranscribeError::InputRead(e.to_string())),
    };
    info!(size = bytes.len(), "batch transcription request");

    match state.bridge().run_aggregate(buffered(bytes)).await {
        Ok(result) => transcript_document(&result),
        Err(error) => error_response(error),
    }
}

/// `POST /stream`: feed the body through the bridge as it arrives. The
/// default response is a live event feed; `Accept: application/json`
/// selects the aggregate document instead. Same bridge either way.
pub async fn transcribe_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let live = !wants_json(&headers);
    info!(live, "streaming transcription request");

    let ingest = body
        .into_data_stream()
        .map_err(|e| TranscribeError::InputRead(e.to_string()));

    if !live {
        return match state.bridge().run_aggregate(ingest).await {
            Ok(result) => transcript_document(&result),
            Err(error) => error_response(error),
        };
    }

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        state.bridge().run_live(ingest, tx).await;
    });
    sse::live_feed(rx)
}

fn buffered(bytes: Bytes) -> impl Stream<Item = Result<Bytes, TranscribeError>> + Send {
    stream::iter([Ok(bytes)])
}

fn transcript_document(result: &RecognitionResult) -> Response {
    Json(serde_json::json!({ "text": result.top_transcript() })).into_response()
}

/// Pre-commit failures become an HTTP status plus a short plain-text
/// diagnostic. Failures after a feed has started never reach here; they
/// travel in-band as `error` events.
fn error_response(error: TranscribeError) -> Response {
    warn!(kind = error.error_kind(), error = %error, "transcription request failed");
    let status =
        StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, error.to_string()).into_response()
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}
