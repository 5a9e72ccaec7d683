//! Process-wide streaming connection counters
//!
//! No persistence; resets on process restart. Exposed to the metrics
//! surface as a gauge (active) plus a counter (total opened).

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared reference to ConnectionTracker
pub type SharedConnectionTracker = Arc<ConnectionTracker>;

/// Active/opened connection counters for this process.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicUsize,
    total_opened: AtomicU64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared reference to this tracker
    pub fn shared(self) -> SharedConnectionTracker {
        Arc::new(self)
    }

    /// Record a session opening.
    pub fn increment(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.total_opened.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a session closing. Saturates at zero so a stray double
    /// decrement cannot wrap the gauge.
    pub fn decrement(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Currently open streaming connections
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Connections opened since process start
    pub fn total_opened(&self) -> u64 {
        self.total_opened.load(Ordering::SeqCst)
    }
}
