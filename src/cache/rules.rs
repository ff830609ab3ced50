//! Invalidation Rules Module
//!
//! Registry mapping events to the scopes that must react to them.

use std::collections::{HashMap, HashSet};

use crate::events::CacheEvent;

// == Rule Index ==
/// Event to affected-scopes registry.
///
/// Many-to-many: one event can affect many scopes and one scope can be
/// registered under many events. Rules only accumulate; there is no removal
/// operation, and `clear`ing the cache leaves the index intact.
#[derive(Debug, Default)]
pub struct RuleIndex {
    rules: HashMap<CacheEvent, HashSet<String>>,
}

impl RuleIndex {
    // == Constructor ==
    /// Creates an empty rule index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Adds `scope` to the scope-set of each event. Idempotent.
    pub fn register(&mut self, scope: &str, events: &[CacheEvent]) {
        for event in events {
            self.rules
                .entry(*event)
                .or_default()
                .insert(scope.to_string());
        }
    }

    // == Scopes For ==
    /// Iterates the scopes affected by `event`.
    ///
    /// Yields nothing when no rule was ever registered for the event.
    pub fn scopes_for(&self, event: CacheEvent) -> impl Iterator<Item = &str> {
        self.rules
            .get(&event)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    // == Length ==
    /// Returns the number of events with at least one registered scope.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
