//! Counting wait/signal primitive gating the loader thread

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Counter {
    count: usize,
    /// Bumped by every `reset`
    generation: u64,
}

/// Counts outstanding requests; the loader thread blocks on it when idle
///
/// One waiter, any number of signallers. `decrement` hands back the
/// reset generation the consumed unit belonged to, so a waiter can tell
/// whether a `reset` has voided its unit since.
#[derive(Debug, Default)]
pub struct ReadySignal {
    counter: Mutex<Counter>,
    ready: Condvar,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake a blocked waiter, or grow the backlog if nobody is waiting
    pub fn increment(&self) {
        let mut counter = self.counter.lock();
        counter.count += 1;
        self.ready.notify_one();
    }

    /// Block until the count is positive, then consume one unit
    pub fn decrement(&self) -> u64 {
        let mut counter = self.counter.lock();
        while counter.count == 0 {
            self.ready.wait(&mut counter);
        }
        counter.count -= 1;
        counter.generation
    }

    /// Force the count to zero without waking anyone
    ///
    /// Only valid when the caller has already dealt with every item the
    /// count stood for. Units consumed before the reset belong to the old
    /// generation.
    pub fn reset(&self) {
        let mut counter = self.counter.lock();
        counter.count = 0;
        counter.generation += 1;
    }

    pub fn value(&self) -> usize {
        self.counter.lock().count
    }

    pub fn generation(&self) -> u64 {
        self.counter.lock().generation
    }
}
