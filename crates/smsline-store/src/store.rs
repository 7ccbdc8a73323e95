use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use smsline_core::Message;
use tracing::{debug, info, warn};

use crate::{subscriber::Subscriber, types::SubscriberId};

/// Process-wide bounded message log with synchronous fan-out.
///
/// Construct one at startup, wrap it in `Arc`, and hand it to every handler
/// that needs it. Messages are kept in arrival order; once `capacity` is
/// exceeded the oldest is evicted.
///
/// Appends are serialized end to end (push, then delivery to a snapshot of
/// the subscriber list), so every subscriber observes messages in exactly the
/// order they were appended. Subscribing and unsubscribing only touch the
/// state lock and are safe from inside a delivery.
pub struct MessageStore {
    capacity: usize,
    state: Mutex<StoreState>,
    /// Held for the whole of `append`.
    fanout: Mutex<()>,
    next_id: AtomicU64,
}

struct StoreState {
    messages: VecDeque<Message>,
    subscribers: Vec<(SubscriberId, Arc<dyn Subscriber>)>,
}

impl MessageStore {
    /// Create an empty store. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(StoreState {
                messages: VecDeque::with_capacity(capacity),
                subscribers: Vec::new(),
            }),
            fanout: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        lock(&self.state).messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    /// Store `message` and deliver it to every current subscriber in
    /// registration order. Returns how many deliveries succeeded.
    ///
    /// A failing subscriber is logged and skipped; it is not removed.
    pub fn append(&self, message: Message) -> usize {
        let _fanout = lock(&self.fanout);

        let snapshot = {
            let mut state = lock(&self.state);
            state.messages.push_back(message.clone());
            while state.messages.len() > self.capacity {
                if let Some(evicted) = state.messages.pop_front() {
                    debug!(id = %evicted.id, "evicted oldest message");
                }
            }
            state.subscribers.clone()
        };

        debug!(
            id = %message.id,
            subscribers = snapshot.len(),
            "message added to store, notifying subscribers"
        );

        let mut delivered = 0;
        for (id, subscriber) in &snapshot {
            match subscriber.deliver(&message) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(subscriber = %id, error = %e, "error notifying subscriber"),
            }
        }
        delivered
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Message> {
        let state = lock(&self.state);
        let skip = state.messages.len().saturating_sub(n);
        state.messages.iter().skip(skip).cloned().collect()
    }

    /// Register a subscriber and return its token.
    ///
    /// Prefer [`subscribe`](Self::subscribe) which removes the subscriber
    /// automatically; this is the raw form for callers managing tokens.
    pub fn add_subscriber(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let total = {
            let mut state = lock(&self.state);
            state.subscribers.push((id, subscriber));
            state.subscribers.len()
        };
        info!(subscriber = %id, total, "subscriber added");
        id
    }

    /// Remove a subscriber. Returns false if the token was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let (removed, remaining) = {
            let mut state = lock(&self.state);
            let before = state.subscribers.len();
            state.subscribers.retain(|(sid, _)| *sid != id);
            (state.subscribers.len() != before, state.subscribers.len())
        };
        if removed {
            info!(subscriber = %id, remaining, "subscriber removed");
        }
        removed
    }

    /// Register a subscriber for as long as the returned guard lives.
    pub fn subscribe(self: &Arc<Self>, subscriber: Arc<dyn Subscriber>) -> Subscription {
        let id = self.add_subscriber(subscriber);
        Subscription {
            store: Arc::clone(self),
            id,
            active: true,
        }
    }

    /// Snapshot the last `n` messages and register `subscriber` atomically.
    ///
    /// Any concurrent append lands either in the returned history or is
    /// delivered to the subscriber, never both and never neither.
    pub fn attach(
        self: &Arc<Self>,
        n: usize,
        subscriber: Arc<dyn Subscriber>,
    ) -> (Vec<Message>, Subscription) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (history, total) = {
            let mut state = lock(&self.state);
            let skip = state.messages.len().saturating_sub(n);
            let history: Vec<Message> = state.messages.iter().skip(skip).cloned().collect();
            state.subscribers.push((id, subscriber));
            (history, state.subscribers.len())
        };
        info!(subscriber = %id, total, history = history.len(), "subscriber attached");
        (
            history,
            Subscription {
                store: Arc::clone(self),
                id,
                active: true,
            },
        )
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(smsline_core::config::DEFAULT_STORE_CAPACITY)
    }
}

/// Owned registration in a [`MessageStore`]; unsubscribes on drop.
pub struct Subscription {
    store: Arc<MessageStore>,
    id: SubscriberId,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remove the subscriber from the store. Only the first call has an
    /// effect; returns whether this call removed it.
    pub fn unsubscribe(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.store.unsubscribe(self.id)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
