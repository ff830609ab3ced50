//! Live Cache - a client-side response cache with event-driven invalidation
//!
//! Caches backend responses per (scope, key) in live, observable slots, and
//! keeps them eventually consistent by evicting or refreshing scopes when
//! invalidation events arrive. Refreshes are single-flight per scope and
//! debounced by a hold window after each success.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod tasks;

pub use cache::{CacheStats, CacheStore, FetchOp, SlotHandle};
pub use config::Config;
pub use engine::ResponseCache;
pub use error::{CacheError, Result};
pub use events::{CacheEvent, EventBus};
pub use tasks::spawn_invalidation_task;
