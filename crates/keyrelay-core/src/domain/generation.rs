//! Generation numbers for armed key timers.
//!
//! Every timed key press arms a release timer tagged with a fresh generation.
//! When the timer fires it only clears the per-key slot if the slot still
//! carries its generation, so a stale timer can never release a key that a
//! later press now owns.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free source of unique, increasing generation numbers.
///
/// # Examples
///
/// ```rust
/// use keyrelay_core::domain::GenerationCounter;
///
/// let generations = GenerationCounter::new();
/// assert_eq!(generations.next(), 0);
/// assert_eq!(generations.next(), 1);
/// ```
#[derive(Debug, Default)]
pub struct GenerationCounter {
    inner: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns a fresh generation. Wraps at `u64::MAX`.
    ///
    /// `Relaxed` is enough: uniqueness comes from the atomic add, and the
    /// generation is only compared under the device-link lock.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }
}
