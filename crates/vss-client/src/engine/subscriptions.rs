//! Subscription table.
//!
//! Maps live subscription IDs to bounded update queues. Delivery never waits:
//! a full queue drops the update.

use crate::domain::types::{SignalUpdate, SubscriptionId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Default capacity of each subscription's update queue
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 10;

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Queue was full
    Full,
    /// Listener was gone
    Closed,
    /// No subscription with that ID
    Unknown,
}

/// Delivery counters
#[derive(Debug, Default)]
pub struct SubscriptionStats {
    pub total_delivered: AtomicU64,
    pub total_dropped: AtomicU64,
}

/// Subscription ID to update queue mapping
pub struct SubscriptionTable {
    subscriptions: RwLock<HashMap<SubscriptionId, mpsc::Sender<SignalUpdate>>>,
    buffer: usize,
    stats: SubscriptionStats,
}

impl SubscriptionTable {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
            stats: SubscriptionStats::default(),
        }
    }

    /// Create the update queue for `id` and return its receiving end.
    ///
    /// Registering an ID twice replaces the earlier queue, which then ends.
    pub fn register(&self, id: SubscriptionId) -> mpsc::Receiver<SignalUpdate> {
        let (tx, rx) = mpsc::channel(self.buffer);
        debug!(subscription_id = %id, "Registered subscription");
        self.subscriptions.write().insert(id, tx);
        rx
    }

    /// Try to hand `update` to the subscription's listener.
    ///
    /// Runs under the read lock, so no update is delivered once `take`
    /// has returned.
    pub fn deliver(&self, id: &SubscriptionId, update: SignalUpdate) -> Delivery {
        let outcome = {
            let subscriptions = self.subscriptions.read();
            match subscriptions.get(id) {
                Some(tx) => match tx.try_send(update) {
                    Ok(()) => Delivery::Delivered,
                    Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
                    Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
                },
                None => Delivery::Unknown,
            }
        };

        if outcome == Delivery::Delivered {
            self.stats.total_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.total_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(subscription_id = %id, outcome = ?outcome, "Dropped subscription update");
        }
        outcome
    }

    /// Detach a subscription's queue.
    ///
    /// Exactly one caller gets the sender back; updates arriving while it
    /// is detached are dropped as unknown. The receiver ends once the
    /// returned sender is dropped.
    pub fn take(&self, id: &SubscriptionId) -> Option<mpsc::Sender<SignalUpdate>> {
        let tx = self.subscriptions.write().remove(id);
        if tx.is_some() {
            debug!(subscription_id = %id, "Detached subscription");
        }
        tx
    }

    /// Re-attach a queue detached by [`take`](Self::take).
    pub fn restore(&self, id: SubscriptionId, tx: mpsc::Sender<SignalUpdate>) {
        self.subscriptions.write().entry(id).or_insert(tx);
    }

    /// Drop every subscription (connection teardown)
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.subscriptions.write().drain().collect();
        drained.len()
    }

    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.subscriptions.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }

    pub fn stats(&self) -> &SubscriptionStats {
        &self.stats
    }
}

impl Default for SubscriptionTable {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIPTION_BUFFER)
    }
}
