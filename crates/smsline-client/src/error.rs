use thiserror::Error;

/// Errors raised while talking to the gateway.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Invalid event payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Nothing (not even a keep-alive ping) arrived for too long.
    #[error("Stream idle for {secs}s")]
    IdleTimeout { secs: u64 },

    /// A line grew past the decoder limit without a newline.
    #[error("Stream line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("Gave up after {attempts} reconnect attempts")]
    GaveUp { attempts: u32 },
}
