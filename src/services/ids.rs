//! Per-collection identifier sequences

use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::{AppError, AppResult};

/// Monotonic id allocator for one collection.
///
/// Seeded from the highest stored id at startup; hands out `max + 1`
/// without rescanning storage. Client-chosen ids move the sequence forward
/// so later automatic ids never fall behind them.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: AtomicI32,
}

impl IdSequence {
    pub fn starting_after(last: i32) -> Self {
        Self {
            last: AtomicI32::new(last.max(0)),
        }
    }

    /// Allocate the next id. Fails without moving the sequence once the
    /// last id handed out or observed is `i32::MAX`.
    pub fn next(&self) -> AppResult<i32> {
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map(|last| last + 1)
            .map_err(|_| AppError::Conflict("Identifier space exhausted".to_string()))
    }

    /// Give back `id` if it is still the most recent allocation
    pub fn release(&self, id: i32) -> bool {
        self.last
            .compare_exchange(id, id - 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Record an id chosen by a client
    pub fn observe(&self, id: i32) {
        self.last.fetch_max(id, Ordering::SeqCst);
    }

    pub fn last(&self) -> i32 {
        self.last.load(Ordering::SeqCst)
    }
}
