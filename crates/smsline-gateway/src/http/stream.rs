//! Event stream endpoint, GET /stream
//!
//! Each request gets its own [`StreamSession`] task. The session writes into
//! a bounded channel whose receiving end is the SSE response body; when the
//! client disconnects hyper drops the body and the session cleans up.

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    response::{sse::Sse, IntoResponse},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::app::AppState;
use crate::sse::{ChannelSink, StreamSession};

/// Frames buffered per client before the session waits on the socket.
const SSE_BUFFER: usize = 32;

/// GET /stream: history replay, then live messages and keep-alive pings.
pub async fn stream_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tx, rx) = mpsc::channel(SSE_BUFFER);
    let session = StreamSession::open(
        &state.store,
        state.config.stream.history_replay,
        Duration::from_secs(state.config.stream.keepalive_secs),
        ChannelSink::new(tx),
    );
    info!(
        conn_id = %session.conn_id(),
        subscribers = state.store.subscriber_count(),
        "stream client connected"
    );
    tokio::spawn(session.run());

    (
        // keep reverse proxies from buffering the stream
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(ReceiverStream::new(rx)),
    )
}
