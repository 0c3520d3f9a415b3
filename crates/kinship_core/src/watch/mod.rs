//! Push-based query subscriptions.
//!
//! # Responsibility
//! - Let a consumer register a query once and keep receiving the
//!   latest matching snapshot after every write.
//!
//! # Invariants
//! - A new emission supersedes the prior one; sinks receive the latest
//!   snapshot only, never a queue.
//! - Subscribing delivers the current snapshot immediately.
//! - A failed refresh is logged and leaves the subscriber's previous
//!   snapshot in place.

use crate::repo::RepoResult;
use log::warn;
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Handle identifying one active subscription.
pub type SubscriptionId = u64;

type Refresh = Box<dyn FnMut(&Connection)>;

/// Registry of active query subscriptions.
///
/// The owner of the connection calls [`QueryHub::notify`] after every
/// committed mutation; each registered query re-runs and pushes its
/// new result set to its sink.
#[derive(Default)]
pub struct QueryHub {
    next_id: SubscriptionId,
    subscriptions: BTreeMap<SubscriptionId, Refresh>,
}

impl QueryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a query with its sink and delivers the first snapshot
    /// before returning.
    pub fn subscribe<T, Q, S>(&mut self, conn: &Connection, query: Q, sink: S) -> SubscriptionId
    where
        T: 'static,
        Q: Fn(&Connection) -> RepoResult<T> + 'static,
        S: FnMut(T) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let mut sink = sink;
        let mut refresh: Refresh = Box::new(move |conn| match query(conn) {
            Ok(snapshot) => sink(snapshot),
            Err(err) => {
                warn!(
                    "event=watch_refresh module=watch status=error subscription_id={id} error={err}"
                );
            }
        });

        refresh(conn);
        self.subscriptions.insert(id, refresh);
        id
    }

    /// Cancels one subscription. Returns whether it was active.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Re-runs every registered query and pushes fresh snapshots.
    pub fn notify(&mut self, conn: &Connection) {
        for refresh in self.subscriptions.values_mut() {
            refresh(conn);
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
