//! Multicast delivery of request outcomes
//!
//! Subscribers run on whichever thread raises the event: the loader
//! thread for completed requests, the caller of `Loader::stop` for
//! cancellations. Marshalling to a UI thread is the subscriber's job.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::state::ResultArgs;

type Subscriber = Arc<dyn Fn(&ResultArgs) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct ResultDispatcher {
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_id: AtomicU64,
}

impl ResultDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&ResultArgs) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(subscriber)));
        id
    }

    /// Returns `false` if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Invoke every subscriber, in subscription order
    ///
    /// Works on a snapshot, so subscribers may (un)subscribe from inside
    /// the callback.
    pub fn raise(&self, args: &ResultArgs) {
        let snapshot: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        for subscriber in snapshot {
            subscriber(args);
        }
    }
}

impl std::fmt::Debug for ResultDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultDispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
