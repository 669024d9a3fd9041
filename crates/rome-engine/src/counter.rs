//! Shared progress counter

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Count of classified non-directory entries
///
/// Clones share the same value. Only the walker increments it; anybody may
/// read it while a run is in flight.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    value: Arc<AtomicU64>,
}

impl ProgressCounter {
    /// Create a counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one and return the new value
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
