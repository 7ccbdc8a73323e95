use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// The client side of the response has been dropped.
    #[error("Client disconnected")]
    ClientGone,

    /// The sink was already closed by this session.
    #[error("Stream already closed")]
    Closed,

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}
