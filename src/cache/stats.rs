//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, refreshes and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of `get` calls served from an existing slot
    pub hits: u64,
    /// Number of `get` calls that created a new slot
    pub misses: u64,
    /// Number of event-driven refreshes started
    pub refreshes: u64,
    /// Number of fetch operations that completed with an error
    pub refresh_failures: u64,
    /// Number of refreshes suppressed by the refresh lock
    pub refreshes_skipped: u64,
    /// Number of unobserved slots evicted on invalidation
    pub evictions: u64,
    /// Current number of cached scopes
    pub cached_scopes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Refresh ==
    /// Increments the refresh counter.
    pub fn record_refresh(&mut self) {
        self.refreshes += 1;
    }

    // == Record Refresh Failure ==
    /// Increments the refresh-failure counter.
    pub fn record_refresh_failure(&mut self) {
        self.refresh_failures += 1;
    }

    // == Record Refresh Skipped ==
    /// Increments the skipped-refresh counter.
    pub fn record_refresh_skipped(&mut self) {
        self.refreshes_skipped += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Update Scope Count ==
    /// Updates the current cached-scope count.
    pub fn set_cached_scopes(&mut self, count: usize) {
        self.cached_scopes = count;
    }
}
