//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// Fetch failures are deliberately absent: a failing fetch operation is
/// recovered by the refresh lock (logged and counted), never returned to the
/// caller. A publish that targets a scope whose slot has been evicted or
/// superseded is a benign no-op, not an error.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `get` was called without a fetch operation
    #[error("A fetch operation is required")]
    InvalidFetchOperation,

    /// Scope or key failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
