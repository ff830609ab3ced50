//! Refresh Lock Module
//!
//! Per-scope state machine guarding whether a refresh may run now.

use std::time::Duration;

use tokio::time::Instant;

use crate::cache::FetchOp;

// == Refresh State ==
/// Refresh-coordination record for one scope.
///
/// Pairs the scope's fetch operation with the single-flight lock:
/// - Idle: not processing, lock expired; a refresh may start.
/// - Locked: not processing, but within the hold window after a success.
/// - Processing: a fetch is in flight.
///
/// A successful completion holds the lock for the configured duration,
/// bounding refresh frequency when events arrive in bursts. A failed
/// completion releases the lock immediately so the next qualifying event can
/// retry. The state machine has no terminal state; it lives as long as the
/// scope's slot.
#[derive(Debug)]
pub struct RefreshState<T> {
    /// The scope's asynchronous producer, re-invoked on every refresh
    fetch: FetchOp<T>,
    /// True while a fetch is in flight
    processing: bool,
    /// Instant after which the lock no longer blocks refreshes
    lock_expiry: Instant,
    /// Hold window applied after a successful completion
    hold: Duration,
    /// Slot incarnation this state belongs to
    generation: u64,
}

impl<T> RefreshState<T> {
    // == Constructor ==
    /// Creates a fresh state in Idle: not processing, lock already expired.
    pub fn new(fetch: FetchOp<T>, hold: Duration, generation: u64) -> Self {
        Self {
            fetch,
            processing: false,
            lock_expiry: Instant::now(),
            hold,
            generation,
        }
    }

    // == Can Process ==
    /// True only in Idle: no fetch in flight and the hold window elapsed.
    pub fn can_process(&self) -> bool {
        !self.processing && Instant::now() >= self.lock_expiry
    }

    // == Begin ==
    /// Transitions to Processing. Callers check [`can_process`](Self::can_process)
    /// before starting an event-driven refresh; initial population begins on
    /// a freshly created state.
    pub fn begin(&mut self) {
        self.processing = true;
    }

    // == Complete Success ==
    /// Leaves Processing and holds the lock for the configured duration.
    pub fn complete_success(&mut self) {
        self.processing = false;
        self.lock_expiry = Instant::now() + self.hold;
    }

    // == Complete Failure ==
    /// Leaves Processing with the lock released, permitting an immediate
    /// retry on the next qualifying event.
    pub fn complete_failure(&mut self) {
        self.processing = false;
        self.lock_expiry = Instant::now();
    }

    // == Accessors ==
    /// True while a fetch is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// The scope's fetch operation.
    pub fn fetch(&self) -> &FetchOp<T> {
        &self.fetch
    }

    /// The slot incarnation this state was created for.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
