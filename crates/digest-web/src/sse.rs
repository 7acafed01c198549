//! Server-Sent Events for digest generation progress.
//!
//! Each event is named after its kind (`digest_started`, `digest_ready`, ...)
//! so browsers can `addEventListener` per kind; the data is the JSON event.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_core::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::{AppEvent, SharedState};

/// Lagged receivers skip the missed events rather than closing the stream.
pub async fn sse_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe())
        .filter_map(|received| received.ok().and_then(|event| to_sse(&event)))
        .map(Ok);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_sse(event: &AppEvent) -> Option<Event> {
    Event::default().event(event.kind()).json_data(event).ok()
}
