//! Event Bus Module
//!
//! Process-wide broadcast stream of cache events.

use tokio::sync::broadcast;
use tracing::debug;

use crate::config::Config;
use crate::events::CacheEvent;

// == Event Bus ==
/// Broadcast channel of [`CacheEvent`]s.
///
/// Dispatch is fire-and-forget: delivery is in-order per subscriber, nothing
/// is acknowledged, and an event dispatched while nobody subscribes is
/// simply dropped. Clones share the same underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CacheEvent>,
}

impl EventBus {
    // == Constructor ==
    /// Creates a bus buffering up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Creates a bus from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.event_capacity)
    }

    // == Dispatch ==
    /// Broadcasts an event to all current subscribers.
    pub fn dispatch(&self, event: CacheEvent) {
        debug!("Dispatching event: {:?}", event);
        let _ = self.tx.send(event);
    }

    // == Subscribe ==
    /// Returns a receiver observing every event dispatched from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.tx.subscribe()
    }

    // == Subscriber Count ==
    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
