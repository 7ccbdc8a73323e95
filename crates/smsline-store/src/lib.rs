pub mod error;
pub mod store;
pub mod subscriber;
pub mod types;

pub use error::StoreError;
pub use store::{MessageStore, Subscription};
pub use subscriber::{ChannelSubscriber, Subscriber};
pub use types::SubscriberId;
