//! Engine Facade
//!
//! Public asynchronous surface over the cache store.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::{CacheStats, CacheStore, FetchOp, FetchTicket, SlotHandle};
use crate::config::Config;
use crate::error::Result;
use crate::events::CacheEvent;

// == Response Cache ==
/// Shared handle to the cache engine.
///
/// Wraps the synchronous [`CacheStore`] in `Arc<RwLock<_>>`: every mutation
/// runs in a short critical section under the write lock, while fetch
/// operations are awaited by spawned tasks with no lock held. Cloning is
/// cheap and clones share the same cache.
#[derive(Debug, Clone)]
pub struct ResponseCache<T> {
    store: Arc<RwLock<CacheStore<T>>>,
}

impl<T: Clone + Send + Sync + 'static> ResponseCache<T> {
    // == Constructor ==
    /// Creates a new ResponseCache over the given store.
    pub fn new(store: CacheStore<T>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Creates a new ResponseCache from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::new(config.hold_duration()))
    }

    // == Get ==
    /// Returns a live handle for (scope, key).
    ///
    /// On a hit the existing slot is returned and `fetch` is never invoked.
    /// On a miss a fresh slot is created and populated in the background;
    /// the handle observes the value once the fetch completes. Invalidation
    /// rules for `refresh_on` are registered either way.
    ///
    /// # Errors
    /// `InvalidFetchOperation` when `fetch` is `None`, `InvalidRequest` when
    /// scope or key fails validation; both before any cache mutation.
    pub async fn get(
        &self,
        scope: &str,
        key: &str,
        fetch: Option<FetchOp<T>>,
        refresh_on: &[CacheEvent],
    ) -> Result<SlotHandle<T>> {
        let (handle, ticket) = self.store.write().await.get(scope, key, fetch, refresh_on)?;
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
        Ok(handle)
    }

    // == Invalidate ==
    /// Applies an event to every scope registered for it: evicts unobserved
    /// slots and refreshes observed ones whose lock admits a refresh.
    pub async fn invalidate(&self, event: CacheEvent) {
        let tickets = self.store.write().await.plan_invalidation(event);
        for ticket in tickets {
            self.spawn_fetch(ticket);
        }
    }

    // == Clear ==
    /// Resets all slots, scope bindings and refresh states.
    ///
    /// Invalidation rules persist; the next `get` for any scope is a
    /// first-time miss.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    // == Internals ==
    /// Runs a ticket's fetch to completion on a background task and reports
    /// the outcome back to the store.
    fn spawn_fetch(&self, ticket: FetchTicket<T>) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let outcome = ticket.fetch.invoke().await;
            store
                .write()
                .await
                .complete_fetch(&ticket.scope, ticket.generation, outcome);
        });
    }
}
