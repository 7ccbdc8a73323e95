use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use smsline_core::{config::ClientConfig, Message};
use smsline_protocol::StreamEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::decoder::EventDecoder;
use crate::error::ClientError;

/// Drop the connection when nothing arrives for this long. The gateway pings
/// every 30 s, so this allows two missed pings plus slack.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(75);

/// What the listener reports to the presentation side.
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    Connected,
    History(Vec<Message>),
    Message(Message),
    /// Connection lost; the next attempt starts after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
}

enum SessionEnd {
    /// Server closed the body cleanly.
    StreamEnded,
    /// Nobody is consuming listener events any more.
    ReceiverGone,
}

/// Long-lived stream consumer with automatic reconnect.
pub struct StreamListener {
    http: reqwest::Client,
    url: String,
    backoff: Backoff,
    idle_timeout: Duration,
}

impl StreamListener {
    pub fn new(url: impl Into<String>, backoff: Backoff) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            backoff,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self::new(cfg.url.clone(), Backoff::from_config(cfg))
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and keep reconnecting until the receiver is dropped or the
    /// attempt cap is hit.
    pub async fn run(mut self, tx: mpsc::Sender<ListenerEvent>) -> Result<(), ClientError> {
        loop {
            match self.connect_once(&tx).await {
                Ok(SessionEnd::ReceiverGone) => return Ok(()),
                Ok(SessionEnd::StreamEnded) => warn!(url = %self.url, "message stream closed by server"),
                Err(e) => warn!(url = %self.url, error = %e, "message stream error"),
            }

            let Some(delay) = self.backoff.next_delay() else {
                let attempts = self.backoff.attempts();
                warn!(attempts, "giving up on message stream");
                return Err(ClientError::GaveUp { attempts });
            };
            let attempt = self.backoff.attempts();
            info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting");
            if tx.send(ListenerEvent::Reconnecting { attempt, delay }).await.is_err() {
                return Ok(());
            }
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_once(&mut self, tx: &mpsc::Sender<ListenerEvent>) -> Result<SessionEnd, ClientError> {
        let resp = self
            .http
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status().as_u16()));
        }

        self.backoff.reset();
        info!(url = %self.url, "connected to message stream");
        if tx.send(ListenerEvent::Connected).await.is_err() {
            return Ok(SessionEnd::ReceiverGone);
        }

        let mut decoder = EventDecoder::new();
        let mut body = resp.bytes_stream();
        loop {
            let chunk = match tokio::time::timeout(self.idle_timeout, body.next()).await {
                Ok(Some(chunk)) => chunk?,
                Ok(None) => return Ok(SessionEnd::StreamEnded),
                Err(_) => {
                    return Err(ClientError::IdleTimeout {
                        secs: self.idle_timeout.as_secs(),
                    })
                }
            };

            for item in decoder.push(&chunk) {
                let event = match item {
                    Ok(StreamEvent::History { messages }) => {
                        info!(count = messages.len(), "received message history");
                        ListenerEvent::History(messages)
                    }
                    Ok(StreamEvent::Message { message }) => {
                        debug!(id = %message.id, from = %message.from, "new message");
                        ListenerEvent::Message(message)
                    }
                    Err(ClientError::Decode(e)) => {
                        // one bad frame does not end the session
                        warn!(error = %e, "error parsing stream event");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if tx.send(event).await.is_err() {
                    return Ok(SessionEnd::ReceiverGone);
                }
            }
        }
    }
}
