//! Value Slot Module
//!
//! Live, observable value container bound to a scope.

use tokio::sync::watch;

// == Slot ==
/// The store-owned side of a scope's cached value.
///
/// Wraps a watch channel holding `Option<T>`: `None` until the first fetch
/// completes, then always the latest published value. Consumers never hold a
/// `Slot`; they hold [`SlotHandle`]s obtained from it.
#[derive(Debug)]
pub struct Slot<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> Slot<T> {
    // == Constructor ==
    /// Creates a slot with no value yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    // == Handle ==
    /// Returns a new subscriber handle to this slot.
    ///
    /// The handle observes the current value (if any) and all future
    /// publishes.
    pub fn handle(&self) -> SlotHandle<T> {
        SlotHandle {
            rx: self.tx.subscribe(),
        }
    }

    // == Publish ==
    /// Replaces the slot's value, notifying all current handles.
    ///
    /// The value is stored even when nobody is subscribed, so a handle taken
    /// later still sees it.
    pub fn publish(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    // == Is Observed ==
    /// Returns true while at least one handle to this slot is alive.
    pub fn is_observed(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Slot Handle ==
/// A consumer's live, read-only view of a scope's cached value.
///
/// Dropping every handle of a slot marks the scope unobserved, making it a
/// candidate for eviction on the next invalidation event.
#[derive(Debug, Clone)]
pub struct SlotHandle<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> SlotHandle<T> {
    // == Current ==
    /// Returns the latest published value, or `None` before the first publish.
    pub fn current(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    // == Value ==
    /// Waits until the slot holds a value and returns it.
    ///
    /// Returns `None` if the slot is destroyed (evicted or superseded)
    /// before a value was ever published.
    pub async fn value(&mut self) -> Option<T> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        }
    }
}

impl<T> SlotHandle<T> {
    // == Changed ==
    /// Waits for the next publish after the last one seen by this handle.
    ///
    /// Returns false once the slot has been destroyed and no further values
    /// can arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
