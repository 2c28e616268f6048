//! Thread-safe sequence counter for outbound packet numbering.
//!
//! Every outbound header carries a `SeqNumber=` field so device-side logs can
//! be correlated with host requests.  The counter is per-session, starts at
//! zero, and is not persisted across restarts.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter shared between the foreground control
/// flow and the keepalive supervisor.
///
/// Backed by an `AtomicU64`; `Relaxed` ordering is sufficient because the
/// value is only used for numbering, not for memory synchronisation.
///
/// # Examples
///
/// ```rust
/// use aquahud_core::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SequenceCounter {
    inner: AtomicU64,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns the next sequence number and atomically increments the counter.
    ///
    /// Wraps around from `u64::MAX` to 0 without panicking.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the current value without incrementing.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}
