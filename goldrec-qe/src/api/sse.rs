//! GET /events: SSE stream of every engine event

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use tracing::info;

use crate::AppState;

pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(subscribers = state.event_bus.subscriber_count(), "New SSE client connected");
    goldrec_common::sse::create_event_sse_stream(crate::config::MODULE_NAME, &state.event_bus)
}
