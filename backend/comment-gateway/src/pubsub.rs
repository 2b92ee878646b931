//! In-process publish/subscribe registry
//!
//! Subscribers register against a named topic and receive every value
//! published on that topic after registration. Each subscriber owns an
//! unbounded channel, so a slow reader never blocks the publisher.

use futures_util::stream::Stream;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Topic carrying every comment stored by `addComment`
pub const COMMENT_ADDED: &str = "commentAdded";

/// Unique identifier for a subscriber
///
/// Handed out on `subscribe` so a caller can unregister precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber<T> {
    id: SubscriberId,
    sender: UnboundedSender<T>,
}

// topic -> list of subscribers
type Registry<T> = RwLock<HashMap<String, Vec<Subscriber<T>>>>;

/// Drop `id` from `topic`, removing the topic once it has no subscribers.
/// Returns whether an entry was removed.
fn remove_subscriber<T>(registry: &Registry<T>, topic: &str, id: SubscriberId) -> bool {
    let mut guard = registry.write();

    let Some(subscribers) = guard.get_mut(topic) else {
        return false;
    };

    let before = subscribers.len();
    subscribers.retain(|s| s.id != id);
    let removed = before != subscribers.len();

    if removed {
        tracing::debug!(
            topic,
            subscriber_id = ?id,
            remaining = subscribers.len(),
            "Removed subscriber"
        );
    }

    if subscribers.is_empty() {
        guard.remove(topic);
    }

    removed
}

/// Topic registry for event subscribers
///
/// Cloning is cheap; all clones share the same registry.
pub struct PubSub<T> {
    inner: Arc<Registry<T>>,
}

impl<T> Clone for PubSub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for PubSub<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> PubSub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber on `topic`
    ///
    /// The returned stream yields every value published on the topic from
    /// this point on. Dropping it unregisters the subscriber.
    pub fn subscribe(&self, topic: &str) -> EventStream<T> {
        let (tx, rx) = unbounded_channel();
        let id = SubscriberId::new();

        let mut guard = self.inner.write();
        let subscribers = guard.entry(topic.to_string()).or_default();
        subscribers.push(Subscriber { id, sender: tx });

        tracing::debug!(
            topic,
            subscriber_id = ?id,
            total_subscribers = subscribers.len(),
            "Added subscriber"
        );

        EventStream {
            id,
            topic: topic.to_string(),
            registry: Arc::downgrade(&self.inner),
            receiver: rx,
        }
    }

    /// Remove a specific subscriber from a topic
    pub fn unsubscribe(&self, topic: &str, id: SubscriberId) {
        remove_subscriber(&self.inner, topic, id);
    }

    /// Deliver `value` to every live subscriber of `topic`
    ///
    /// Returns the number of subscribers that received it. Publishing to a
    /// topic nobody listens on is not an error.
    pub fn publish(&self, topic: &str, value: T) -> usize {
        let mut guard = self.inner.write();

        let Some(subscribers) = guard.get_mut(topic) else {
            tracing::trace!(topic, "Publish with no subscribers");
            return 0;
        };

        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.sender.send(value.clone()).is_ok());
        let delivered = subscribers.len();

        if before != delivered {
            tracing::debug!(
                topic,
                pruned = before - delivered,
                active = delivered,
                "Cleaned up dead subscribers"
            );
        }

        if subscribers.is_empty() {
            guard.remove(topic);
        }

        delivered
    }

    /// Number of subscribers currently registered on `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.read().get(topic).map(|v| v.len()).unwrap_or(0)
    }
}

/// Receiving side of a subscription
///
/// A lazy, unbounded sequence of published values. It ends once the
/// subscriber is unregistered or the registry is dropped. Dropping the
/// stream removes its registry entry.
pub struct EventStream<T> {
    id: SubscriberId,
    topic: String,
    registry: Weak<Registry<T>>,
    receiver: UnboundedReceiver<T>,
}

impl<T> EventStream<T> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl<T> Stream for EventStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_recv(cx)
    }
}

impl<T> Drop for EventStream<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            remove_subscriber(&registry, &self.topic, self.id);
        }
    }
}
