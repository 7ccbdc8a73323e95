use std::sync::Arc;
use std::time::Duration;

use smsline_core::{ConnId, Message};
use smsline_protocol::{SseFrame, StreamEvent};
use smsline_store::{ChannelSubscriber, MessageStore, Subscription};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::sse::{error::StreamError, sink::FrameSink};

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client went away (response body dropped).
    ClientDisconnected,
    /// A frame could not be written.
    WriteFailed,
}

/// Summary returned by [`StreamSession::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub reason: CloseReason,
    pub messages_sent: usize,
    pub pings_sent: usize,
    /// Whether cleanup removed the subscriber from the store.
    pub unsubscribed: bool,
}

/// One client connection to the event stream.
///
/// Lifecycle: `open` attaches to the store (history snapshot + live
/// subscription), `run` writes the history event, then forwards every new
/// message and a keep-alive comment every `keepalive` until the client leaves
/// or a write fails. Cleanup runs once on every exit path.
pub struct StreamSession<S: FrameSink> {
    conn_id: ConnId,
    sink: S,
    subscription: Subscription,
    rx: mpsc::UnboundedReceiver<Message>,
    history: Option<Vec<Message>>,
    keepalive: Duration,
    messages_sent: usize,
    pings_sent: usize,
    closed: bool,
}

impl<S: FrameSink> StreamSession<S> {
    pub fn open(
        store: &Arc<MessageStore>,
        history_replay: usize,
        keepalive: Duration,
        sink: S,
    ) -> Self {
        let (subscriber, rx) = ChannelSubscriber::new();
        let (history, subscription) = store.attach(history_replay, Arc::new(subscriber));
        Self {
            conn_id: ConnId::new(),
            sink,
            subscription,
            rx,
            history: Some(history),
            keepalive,
            messages_sent: 0,
            pings_sent: 0,
            closed: false,
        }
    }

    pub fn conn_id(&self) -> &ConnId {
        &self.conn_id
    }

    /// Drive the connection to completion.
    pub async fn run(mut self) -> SessionReport {
        let reason = self.pump().await;
        let unsubscribed = self.cleanup().await;
        info!(
            conn_id = %self.conn_id,
            ?reason,
            messages = self.messages_sent,
            pings = self.pings_sent,
            "stream session closed"
        );
        SessionReport {
            reason,
            messages_sent: self.messages_sent,
            pings_sent: self.pings_sent,
            unsubscribed,
        }
    }

    async fn pump(&mut self) -> CloseReason {
        let history = self.history.take().unwrap_or_default();
        debug!(conn_id = %self.conn_id, count = history.len(), "sending history");
        if let Err(e) = self.send_event(&StreamEvent::history(history)).await {
            warn!(conn_id = %self.conn_id, error = %e, "error sending history");
            return CloseReason::WriteFailed;
        }

        // first ping one full period after connect
        let mut keepalive = interval_at(Instant::now() + self.keepalive, self.keepalive);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.sink.closed() => {
                    return CloseReason::ClientDisconnected;
                }

                // the sender stays registered while `self.subscription` lives
                Some(message) = self.rx.recv() => {
                    debug!(conn_id = %self.conn_id, id = %message.id, "forwarding message to client");
                    if let Err(e) = self.send_event(&StreamEvent::message(message)).await {
                        warn!(conn_id = %self.conn_id, error = %e, "error sending message");
                        return CloseReason::WriteFailed;
                    }
                    self.messages_sent += 1;
                }

                _ = keepalive.tick() => {
                    if let Err(e) = self.sink.send(SseFrame::ping()).await {
                        warn!(conn_id = %self.conn_id, error = %e, "error sending ping");
                        return CloseReason::WriteFailed;
                    }
                    self.pings_sent += 1;
                }
            }
        }
    }

    async fn send_event(&mut self, event: &StreamEvent) -> Result<(), StreamError> {
        let frame = SseFrame::event(event)?;
        self.sink.send(frame).await
    }

    /// Unsubscribe and close the output. Idempotent; returns whether this
    /// call removed the subscriber. Close errors are logged, never raised.
    pub async fn cleanup(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;

        let unsubscribed = self.subscription.unsubscribe();
        if let Err(e) = self.sink.close().await {
            warn!(conn_id = %self.conn_id, error = %e, "error closing stream");
        }
        unsubscribed
    }
}
