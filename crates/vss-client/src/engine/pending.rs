//! Pending request table.
//!
//! Maps correlation IDs to the callers waiting for their replies. Every entry
//! is removed exactly once: by the dispatcher delivering the reply, by the
//! caller's timeout, or by the caller going away. Whichever removes the entry
//! owns the outcome; the other paths find nothing and do nothing.

use crate::domain::correlation::CorrelationId;
use crate::domain::error::{ClientError, ClientResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A request waiting for its reply
struct PendingRequest {
    /// Single-use reply slot
    sender: oneshot::Sender<Value>,
    /// When request was registered
    created_at: Instant,
    /// Action name (for logging)
    action: String,
}

/// Statistics for the pending request table
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Replies handed to their caller
    pub total_completed: AtomicU64,
    /// Requests that hit their deadline
    pub total_timeouts: AtomicU64,
    /// Replies with no matching entry (late or unknown)
    pub total_dropped: AtomicU64,
    /// Requests whose caller went away before a reply
    pub total_cancelled: AtomicU64,
}

/// Correlation ID to reply slot mapping.
///
/// Flow:
/// 1. Facade calls `register()` and gets an ID plus a oneshot receiver
/// 2. Facade sends the request carrying the ID as `requestId`
/// 3. Dispatcher receives the reply and calls `complete()`
/// 4. Facade awaits the receiver in `wait()` or times out
#[derive(Default)]
pub struct PendingRequestTable {
    pending: RwLock<HashMap<CorrelationId, PendingRequest>>,
    stats: PendingStats,
}

impl PendingRequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending request and get a receiver for its reply.
    pub fn register(&self, action: &str) -> (CorrelationId, oneshot::Receiver<Value>) {
        let correlation_id = CorrelationId::new();
        let (tx, rx) = oneshot::channel();

        let request = PendingRequest {
            sender: tx,
            created_at: Instant::now(),
            action: action.to_string(),
        };

        self.pending.write().insert(correlation_id, request);
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            action = action,
            "Registered pending request"
        );

        (correlation_id, rx)
    }

    /// Hand `reply` to the caller waiting on `correlation_id`.
    ///
    /// The entry is taken out under the write lock and the send happens after
    /// the lock is released. Returns false when no caller was waiting.
    pub fn complete(&self, correlation_id: &CorrelationId, reply: Value) -> bool {
        let Some(pending) = self.pending.write().remove(correlation_id) else {
            self.stats.total_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %correlation_id,
                "Reply for unknown or expired correlation ID"
            );
            return false;
        };

        let response_time = pending.created_at.elapsed();
        match pending.sender.send(reply) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    action = pending.action,
                    response_time_ms = response_time.as_millis() as u64,
                    "Completed pending request"
                );
                true
            }
            Err(_) => {
                self.stats.total_dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    action = pending.action,
                    "Pending request receiver dropped"
                );
                false
            }
        }
    }

    /// Remove an entry whose deadline passed.
    ///
    /// Returns false if the dispatcher already took it.
    pub fn expire(&self, correlation_id: &CorrelationId) -> bool {
        let Some(pending) = self.pending.write().remove(correlation_id) else {
            return false;
        };
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        warn!(
            correlation_id = %correlation_id,
            action = pending.action,
            elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
            "Request timed out"
        );
        true
    }

    /// Remove an entry whose caller stopped waiting
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        if self.pending.write().remove(correlation_id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Wait for the reply to `correlation_id`, up to `timeout`.
    ///
    /// Exactly one of reply or timeout is reported. If the caller's future is
    /// dropped first, the entry is removed.
    pub async fn wait(
        &self,
        correlation_id: CorrelationId,
        mut rx: oneshot::Receiver<Value>,
        timeout: Duration,
        action: &str,
    ) -> ClientResult<Value> {
        let _guard = CancelOnDrop {
            table: self,
            correlation_id,
        };

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                if self.expire(&correlation_id) {
                    return Err(ClientError::timeout(action));
                }
                // Dispatcher took the entry first; its send is in flight
                rx.await.map_err(|_| ClientError::Closed)
            }
        }
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.read().contains_key(correlation_id)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

struct CancelOnDrop<'a> {
    table: &'a PendingRequestTable,
    correlation_id: CorrelationId,
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        self.table.cancel(&self.correlation_id);
    }
}
