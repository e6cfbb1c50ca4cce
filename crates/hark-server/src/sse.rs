//! Rendering of the live event feed.
//!
//! Each recognition result becomes one unnamed `data:` event; the feed then
//! terminates with exactly one named event (`done` on success, `error` on
//! failure) and nothing follows a terminal event. Proxy buffering is
//! disabled so partial results reach the client as they happen.

use axum::http::{header, HeaderName};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use hark_core::events::TranscriptEvent;

pub fn live_feed(rx: mpsc::UnboundedReceiver<TranscriptEvent>) -> Response {
    let stream = UnboundedReceiverStream::new(rx).map(render_event);
    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(stream),
    )
        .into_response()
}

fn render_event(event: TranscriptEvent) -> Result<Event, axum::Error> {
    match event {
        TranscriptEvent::Result { result } => {
            Event::default().json_data(json!({ "result": &result, "isFinal": result.is_final }))
        }
        TranscriptEvent::Done => Ok(Event::default().event("done").data("{}")),
        TranscriptEvent::Error { error } => Event::default().event("error").json_data(error),
    }
}
