//! Configuration Module
//!
//! Handles loading and managing cache engine configuration from environment variables.

use std::env;
use std::time::Duration;

/// Cache engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Duration in milliseconds the refresh lock is held after a successful refresh
    pub hold_lock_ms: u64,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HOLD_LOCK_MS` - Refresh lock hold duration in milliseconds (default: 1000)
    /// - `EVENT_CAPACITY` - Event channel capacity (default: 64)
    pub fn from_env() -> Self {
        Self {
            hold_lock_ms: env::var("HOLD_LOCK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            event_capacity: env::var("EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
        }
    }

    /// Returns the hold duration as a [`Duration`].
    pub fn hold_duration(&self) -> Duration {
        Duration::from_millis(self.hold_lock_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hold_lock_ms: 1000,
            event_capacity: 64,
        }
    }
}
