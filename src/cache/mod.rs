//! Cache Module
//!
//! Scope-keyed live value slots with invalidation rules and single-flight,
//! lock-coordinated refresh.

mod fetch;
mod refresh;
mod rules;
mod slot;
mod stats;
mod store;


// Re-export public types
pub use fetch::{FetchFuture, FetchOp};
pub use refresh::RefreshState;
pub use rules::RuleIndex;
pub use slot::{Slot, SlotHandle};
pub use stats::CacheStats;
pub use store::{CacheStore, FetchTicket};

// == Public Constants ==
/// Maximum allowed scope length in bytes
pub const MAX_SCOPE_LENGTH: usize = 128;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
