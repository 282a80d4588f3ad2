//! Handles for running performances and registered performers.

use serde::{Deserialize, Serialize};

/// Identity of one running performance (a single-use instance).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PerformanceId(pub u32);

/// Handle of a performer registered into an [`crate::Actor`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PerformerKey(pub u32);

/// Monotonic allocator for PerformanceId and PerformerKey.
/// IDs are opaque externally and never reused within one allocator.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_performance: u32,
    next_performer: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_performance(&mut self) -> PerformanceId {
        let id = PerformanceId(self.next_performance);
        self.next_performance = self.next_performance.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_performer(&mut self) -> PerformerKey {
        let id = PerformerKey(self.next_performer);
        self.next_performer = self.next_performer.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
