use thiserror::Error;

/// Errors a subscriber can report while a message is fanned out to it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The receiving side of the subscriber has gone away.
    #[error("Subscriber closed")]
    SubscriberClosed,

    /// The subscriber refused the message.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}
