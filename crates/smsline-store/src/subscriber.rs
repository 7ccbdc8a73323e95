use smsline_core::Message;
use tokio::sync::mpsc;

use crate::error::StoreError;

/// Receiver of store fan-out.
///
/// `deliver` runs synchronously inside [`MessageStore::append`](crate::MessageStore::append),
/// so implementations must return quickly and must not call `append` themselves.
/// Returning an error is logged by the store; the subscriber stays registered.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, message: &Message) -> Result<(), StoreError>;
}

impl<F> Subscriber for F
where
    F: Fn(&Message) -> Result<(), StoreError> + Send + Sync,
{
    fn deliver(&self, message: &Message) -> Result<(), StoreError> {
        self(message)
    }
}

/// Forwards every delivered message into an unbounded channel.
///
/// This is how async consumers (one stream session per client) attach to the
/// synchronous fan-out without ever blocking `append`.
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSubscriber {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn deliver(&self, message: &Message) -> Result<(), StoreError> {
        self.tx
            .send(message.clone())
            .map_err(|_| StoreError::SubscriberClosed)
    }
}
