use std::convert::Infallible;

use async_trait::async_trait;
use axum::response::sse::Event;
use smsline_protocol::SseFrame;
use tokio::sync::mpsc;

use crate::sse::error::StreamError;

/// Item type of the SSE response body.
pub type SseItem = Result<Event, Infallible>;

/// Where a [`StreamSession`](crate::sse::StreamSession) writes its frames.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Write one frame. An error means the client can no longer be reached.
    async fn send(&mut self, frame: SseFrame) -> Result<(), StreamError>;

    /// Resolves once the client has gone away.
    async fn closed(&self);

    /// Close the output. Calling it twice returns [`StreamError::Closed`].
    async fn close(&mut self) -> Result<(), StreamError>;
}

/// Sink feeding the `Sse` response body through a bounded channel.
///
/// When hyper drops the response (client disconnect), the receiver goes
/// away: `closed()` resolves and every later `send` fails.
pub struct ChannelSink {
    tx: Option<mpsc::Sender<SseItem>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<SseItem>) -> Self {
        Self { tx: Some(tx) }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: SseFrame) -> Result<(), StreamError> {
        let tx = self.tx.as_ref().ok_or(StreamError::Closed)?;
        tx.send(Ok(to_event(frame)))
            .await
            .map_err(|_| StreamError::ClientGone)
    }

    async fn closed(&self) {
        if let Some(tx) = &self.tx {
            tx.closed().await;
        }
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        // dropping the sender ends the response body
        self.tx.take().map(drop).ok_or(StreamError::Closed)
    }
}

/// Convert a protocol frame into an axum SSE event.
pub fn to_event(frame: SseFrame) -> Event {
    match frame {
        SseFrame::Data(json) => Event::default().data(json),
        SseFrame::Comment(text) => Event::default().comment(text),
    }
}
