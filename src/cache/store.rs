//! Cache Store Module
//!
//! Main cache engine combining slot storage, scope bindings, refresh locks
//! and invalidation rules.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{
    CacheStats, FetchOp, RefreshState, RuleIndex, Slot, SlotHandle, MAX_KEY_LENGTH,
    MAX_SCOPE_LENGTH,
};
use crate::error::{CacheError, Result};
use crate::events::CacheEvent;

// == Fetch Ticket ==
/// A fetch admitted by the refresh lock, ready to be executed.
///
/// Tickets are produced under the store lock and executed outside it. The
/// generation ties the eventual completion back to the slot incarnation the
/// fetch was started for; completions of superseded incarnations are
/// discarded.
#[derive(Debug)]
pub struct FetchTicket<T> {
    /// Scope the fetched value belongs to
    pub scope: String,
    /// Slot incarnation the fetch was started for
    pub generation: u64,
    /// The producer to invoke once
    pub fetch: FetchOp<T>,
}

// == Cache Store ==
/// Scope-keyed slot registry with invalidation rules and refresh locks.
///
/// Equality of (scope, key) is the sole cache-hit test: each scope holds at
/// most one current key, so this is a "latest key wins per scope" cache
/// rather than a general key-value cache.
///
/// All methods are synchronous and run under the engine's lock; asynchronous
/// fetch execution happens outside via [`FetchTicket`]s (see
/// [`ResponseCache`](crate::engine::ResponseCache)). A slot, its scope
/// binding and its refresh state are always created and removed together.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Live value slot per scope
    slots: HashMap<String, Slot<T>>,
    /// Key currently considered valid per scope
    bindings: HashMap<String, String>,
    /// Refresh coordination state per scope
    refresh: HashMap<String, RefreshState<T>>,
    /// Event to affected-scopes registry; survives `clear`
    rules: RuleIndex,
    /// Performance statistics
    stats: CacheStats,
    /// Hold window applied after a successful fetch
    hold: Duration,
    /// Monotonic slot incarnation counter
    generations: u64,
}

impl<T: Clone> CacheStore<T> {
    // == Constructor ==
    /// Creates a new CacheStore with the given refresh-lock hold window.
    ///
    /// # Arguments
    /// * `hold` - Duration the refresh lock is held after a successful fetch
    pub fn new(hold: Duration) -> Self {
        Self {
            slots: HashMap::new(),
            bindings: HashMap::new(),
            refresh: HashMap::new(),
            rules: RuleIndex::new(),
            stats: CacheStats::new(),
            hold,
            generations: 0,
        }
    }

    // == Get ==
    /// Returns a live handle for (scope, key), creating and populating a new
    /// slot on a miss.
    ///
    /// Invalidation rules for `refresh_on` are registered unconditionally,
    /// even on a hit. If the scope is already bound to `key`, the existing
    /// slot is returned without a new fetch. Otherwise a fresh slot, binding
    /// and refresh state replace whatever the scope held before, and the
    /// returned ticket carries the fetch to execute; its completion must be
    /// reported via [`complete_fetch`](Self::complete_fetch).
    ///
    /// # Errors
    /// - `InvalidFetchOperation` when `fetch` is `None`
    /// - `InvalidRequest` when scope or key is empty or too long
    ///
    /// Both fail before any cache mutation.
    pub fn get(
        &mut self,
        scope: &str,
        key: &str,
        fetch: Option<FetchOp<T>>,
        refresh_on: &[CacheEvent],
    ) -> Result<(SlotHandle<T>, Option<FetchTicket<T>>)> {
        let fetch = fetch.ok_or(CacheError::InvalidFetchOperation)?;
        Self::validate(scope, key)?;

        self.rules.register(scope, refresh_on);

        if self.bindings.get(scope).is_some_and(|bound| bound == key) {
            if let Some(slot) = self.slots.get(scope) {
                debug!("Getting from cache {}_{}", scope, key);
                self.stats.record_hit();
                return Ok((slot.handle(), None));
            }
        }

        debug!("Executing fetch for scope change: {}", scope);
        self.stats.record_miss();
        let (handle, ticket) = self.create_slot(scope, key, fetch);
        Ok((handle, Some(ticket)))
    }

    // == Plan Invalidation ==
    /// Applies an event to every scope registered for it.
    ///
    /// Unobserved slots are evicted outright. Observed slots get a refresh
    /// ticket when their lock admits one; otherwise the refresh is skipped
    /// (never queued) and the scope stays stale until the next qualifying
    /// event.
    pub fn plan_invalidation(&mut self, event: CacheEvent) -> Vec<FetchTicket<T>> {
        let scopes: Vec<String> = self.rules.scopes_for(event).map(str::to_string).collect();

        let mut tickets = Vec::new();
        for scope in scopes {
            let observed = match self.slots.get(&scope) {
                Some(slot) => slot.is_observed(),
                None => continue,
            };

            if !observed {
                info!("Evicting unobserved scope: {}", scope);
                self.evict(&scope);
                continue;
            }

            let state = match self.refresh.get_mut(&scope) {
                Some(state) => state,
                None => continue,
            };
            if !state.can_process() {
                debug!(
                    "Refresh in progress or holding exclusive lock on: {}",
                    scope
                );
                self.stats.record_refresh_skipped();
                continue;
            }

            info!("Refreshing cache via fetch operation on scope: {}", scope);
            state.begin();
            let ticket = FetchTicket {
                scope: scope.clone(),
                generation: state.generation(),
                fetch: state.fetch().clone(),
            };
            self.stats.record_refresh();
            tickets.push(ticket);
        }

        tickets
    }

    // == Complete Fetch ==
    /// Reports the outcome of a ticket's fetch.
    ///
    /// A completion whose scope is gone or whose generation no longer
    /// matches (evicted or superseded mid-flight) is discarded as a no-op.
    /// Success publishes the value into the slot and holds the lock;
    /// failure releases the lock for immediate retry and is logged, never
    /// surfaced to slot subscribers.
    pub fn complete_fetch(&mut self, scope: &str, generation: u64, outcome: anyhow::Result<T>) {
        let stale = self
            .refresh
            .get(scope)
            .map_or(true, |state| state.generation() != generation);
        if stale {
            debug!("Discarding stale fetch completion for scope: {}", scope);
            return;
        }

        match outcome {
            Ok(value) => {
                if let Some(state) = self.refresh.get_mut(scope) {
                    state.complete_success();
                }
                self.publish(scope, value);
            }
            Err(err) => {
                if let Some(state) = self.refresh.get_mut(scope) {
                    state.complete_failure();
                }
                self.stats.record_refresh_failure();
                warn!("Fetch operation failed on scope {}: {:#}", scope, err);
            }
        }
    }

    // == Publish ==
    /// Publishes a value into the scope's slot, notifying all subscribers.
    ///
    /// A missing slot is a no-op.
    pub fn publish(&self, scope: &str, value: T) {
        if let Some(slot) = self.slots.get(scope) {
            slot.publish(value);
        }
    }

    // == Clear ==
    /// Resets all slots, scope bindings and refresh states to empty.
    ///
    /// Invalidation rules and the cumulative counters persist; in-flight
    /// fetch completions for cleared scopes are discarded when they arrive.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.bindings.clear();
        self.refresh.clear();
        self.stats.set_cached_scopes(0);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_cached_scopes(self.slots.len());
        stats
    }

    // == Current Key ==
    /// Returns the key the scope is currently bound to, if any.
    pub fn current_key(&self, scope: &str) -> Option<&str> {
        self.bindings.get(scope).map(String::as_str)
    }

    // == Length ==
    /// Returns the current number of cached scopes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    // == Is Empty ==
    /// Returns true if no scope is cached.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // == Internals ==
    fn validate(scope: &str, key: &str) -> Result<()> {
        if scope.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Scope must not be empty".to_string(),
            ));
        }
        if scope.len() > MAX_SCOPE_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Scope exceeds maximum length of {} bytes",
                MAX_SCOPE_LENGTH
            )));
        }
        if key.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Key must not be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        Ok(())
    }

    /// Installs a fresh slot, binding and Processing refresh state for the
    /// scope, superseding any previous incarnation.
    fn create_slot(&mut self, scope: &str, key: &str, fetch: FetchOp<T>) -> (SlotHandle<T>, FetchTicket<T>) {
        self.generations += 1;
        let generation = self.generations;

        let slot = Slot::new();
        let handle = slot.handle();
        self.slots.insert(scope.to_string(), slot);
        self.bindings.insert(scope.to_string(), key.to_string());

        let mut state = RefreshState::new(fetch.clone(), self.hold, generation);
        state.begin();
        self.refresh.insert(scope.to_string(), state);
        self.stats.set_cached_scopes(self.slots.len());

        let ticket = FetchTicket {
            scope: scope.to_string(),
            generation,
            fetch,
        };
        (handle, ticket)
    }

    fn evict(&mut self, scope: &str) {
        self.slots.remove(scope);
        self.bindings.remove(scope);
        self.refresh.remove(scope);
        self.stats.record_eviction();
        self.stats.set_cached_scopes(self.slots.len());
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const EVENT: CacheEvent = CacheEvent::UserChanged;

    fn fixed_fetch(value: &str) -> FetchOp<String> {
        let value = value.to_string();
        FetchOp::new(move || {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    fn failing_fetch() -> FetchOp<String> {
        FetchOp::new(|| async { Err(anyhow::anyhow!("backend down")) })
    }

    fn test_store() -> CacheStore<String> {
        CacheStore::new(Duration::ZERO)
    }

    #[test]
    fn test_store_new() {
        let store = test_store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_requires_fetch_operation() {
        let mut store = test_store();

        let result = store.get("profile", "user1", None, &[]);
        assert!(matches!(result, Err(CacheError::InvalidFetchOperation)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_rejects_empty_scope_and_key() {
        let mut store = test_store();

        let result = store.get("", "user1", Some(fixed_fetch("a")), &[]);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

        let result = store.get("profile", "", Some(fixed_fetch("a")), &[]);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_get_rejects_oversized_scope_and_key() {
        let mut store = test_store();

        let long_scope = "x".repeat(MAX_SCOPE_LENGTH + 1);
        let result = store.get(&long_scope, "k", Some(fixed_fetch("a")), &[]);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        let result = store.get("profile", &long_key, Some(fixed_fetch("a")), &[]);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_get_miss_creates_slot_and_ticket() {
        let mut store = test_store();

        let (handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();
        let ticket = ticket.unwrap();

        assert_eq!(ticket.scope, "profile");
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_key("profile"), Some("user1"));
        assert_eq!(handle.current(), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_get_hit_returns_existing_slot_without_ticket() {
        let mut store = test_store();

        let (_handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[])
            .unwrap();
        let ticket = ticket.unwrap();
        store.complete_fetch("profile", ticket.generation, Ok("value1".to_string()));

        let (second, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("b")), &[])
            .unwrap();

        assert!(ticket.is_none());
        assert_eq!(second.current(), Some("value1".to_string()));
        assert_eq!(store.stats().hits, 1);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_key_change_supersedes_slot() {
        let mut store = test_store();

        let (old_handle, old_ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[])
            .unwrap();
        let old_ticket = old_ticket.unwrap();

        let (new_handle, new_ticket) = store
            .get("profile", "user2", Some(fixed_fetch("b")), &[])
            .unwrap();
        let new_ticket = new_ticket.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_key("profile"), Some("user2"));
        assert!(new_ticket.generation > old_ticket.generation);

        // The superseded fetch is discarded entirely
        store.complete_fetch("profile", old_ticket.generation, Ok("stale".to_string()));
        assert_eq!(new_handle.current(), None);
        assert_eq!(old_handle.current(), None);

        store.complete_fetch("profile", new_ticket.generation, Ok("fresh".to_string()));
        assert_eq!(new_handle.current(), Some("fresh".to_string()));
    }

    #[test]
    fn test_complete_fetch_publishes_to_subscribers() {
        let mut store = test_store();

        let (handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[])
            .unwrap();
        let ticket = ticket.unwrap();

        store.complete_fetch("profile", ticket.generation, Ok("value1".to_string()));
        assert_eq!(handle.current(), Some("value1".to_string()));
    }

    #[test]
    fn test_complete_fetch_for_evicted_scope_is_noop() {
        let mut store = test_store();

        let (handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();
        let ticket = ticket.unwrap();
        store.complete_fetch("profile", ticket.generation, Ok("value1".to_string()));

        // No subscriber left: the event evicts the scope
        drop(handle);
        let tickets = store.plan_invalidation(EVENT);
        assert!(tickets.is_empty());
        assert!(store.is_empty());

        // A completion arriving after eviction changes nothing
        store.complete_fetch("profile", ticket.generation, Ok("late".to_string()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_plan_invalidation_without_rules_is_noop() {
        let mut store = test_store();

        let (_handle, _ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[])
            .unwrap();

        let tickets = store.plan_invalidation(EVENT);
        assert!(tickets.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_plan_invalidation_evicts_unobserved_scope() {
        let mut store = test_store();

        let (handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();
        store.complete_fetch("profile", ticket.unwrap().generation, Ok("v".to_string()));
        drop(handle);

        let tickets = store.plan_invalidation(EVENT);

        assert!(tickets.is_empty());
        assert!(store.is_empty());
        assert_eq!(store.current_key("profile"), None);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_plan_invalidation_refreshes_observed_scope() {
        let mut store = test_store();

        let (handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();
        store.complete_fetch("profile", ticket.unwrap().generation, Ok("v1".to_string()));

        let tickets = store.plan_invalidation(EVENT);
        assert_eq!(tickets.len(), 1);
        assert_eq!(store.stats().refreshes, 1);

        store.complete_fetch("profile", tickets[0].generation, Ok("v2".to_string()));
        assert_eq!(handle.current(), Some("v2".to_string()));
    }

    #[test]
    fn test_single_flight_while_processing() {
        let mut store = test_store();

        // Initial population still in flight
        let (_handle, _ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();

        let tickets = store.plan_invalidation(EVENT);

        assert!(tickets.is_empty());
        assert_eq!(store.stats().refreshes_skipped, 1);
    }

    #[test]
    fn test_hold_window_suppresses_refresh() {
        let mut store: CacheStore<String> = CacheStore::new(Duration::from_millis(50));

        let (_handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();
        store.complete_fetch("profile", ticket.unwrap().generation, Ok("v1".to_string()));

        // Within the hold window the refresh is skipped
        assert!(store.plan_invalidation(EVENT).is_empty());
        assert_eq!(store.stats().refreshes_skipped, 1);

        // After the hold window it goes through
        sleep(Duration::from_millis(60));
        assert_eq!(store.plan_invalidation(EVENT).len(), 1);
    }

    #[test]
    fn test_failed_fetch_permits_immediate_retry() {
        let mut store: CacheStore<String> = CacheStore::new(Duration::from_secs(60));

        let (_handle, ticket) = store
            .get("profile", "user1", Some(failing_fetch()), &[EVENT])
            .unwrap();
        store.complete_fetch(
            "profile",
            ticket.unwrap().generation,
            Err(anyhow::anyhow!("backend down")),
        );

        // No hold window after a failure, even with a long configured hold
        let tickets = store.plan_invalidation(EVENT);
        assert_eq!(tickets.len(), 1);
        assert_eq!(store.stats().refresh_failures, 1);
    }

    #[test]
    fn test_clear_resets_cache_but_keeps_rules() {
        let mut store = test_store();

        let (_handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();
        store.complete_fetch("profile", ticket.unwrap().generation, Ok("v".to_string()));

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.current_key("profile"), None);

        // A get after clear is a first-time miss again
        let (handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("b")), &[])
            .unwrap();
        let ticket = ticket.unwrap();
        store.complete_fetch("profile", ticket.generation, Ok("w".to_string()));

        // The rule registered before clear still routes the event
        let tickets = store.plan_invalidation(EVENT);
        assert_eq!(tickets.len(), 1);
        store.complete_fetch("profile", tickets[0].generation, Ok("x".to_string()));
        assert_eq!(handle.current(), Some("x".to_string()));
    }

    #[test]
    fn test_rules_registered_even_on_hit() {
        let mut store = test_store();

        let (_handle, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[])
            .unwrap();
        store.complete_fetch("profile", ticket.unwrap().generation, Ok("v".to_string()));

        // Hit path registers the new rule
        let (_second, ticket) = store
            .get("profile", "user1", Some(fixed_fetch("b")), &[EVENT])
            .unwrap();
        assert!(ticket.is_none());

        let tickets = store.plan_invalidation(EVENT);
        assert_eq!(tickets.len(), 1);
    }

    #[test]
    fn test_independent_scopes_refresh_independently() {
        let mut store = test_store();

        let (_h1, t1) = store
            .get("profile", "user1", Some(fixed_fetch("a")), &[EVENT])
            .unwrap();
        let (_h2, t2) = store
            .get("settings", "user1", Some(fixed_fetch("b")), &[EVENT])
            .unwrap();
        store.complete_fetch("profile", t1.unwrap().generation, Ok("p".to_string()));
        store.complete_fetch("settings", t2.unwrap().generation, Ok("s".to_string()));

        let tickets = store.plan_invalidation(EVENT);
        assert_eq!(tickets.len(), 2);
    }
}
