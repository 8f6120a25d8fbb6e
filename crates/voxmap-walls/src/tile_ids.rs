use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

/// First identifier handed out on a fresh install. Lower ids are left to the host.
pub const BASE_TILE_ID: u64 = 10_000_000;

/// Monotonic tile identifier source shared by every wall creation.
#[derive(Debug)]
pub struct TileIdAllocator {
    next: AtomicU64,
}

impl Default for TileIdAllocator {
    fn default() -> Self {
        Self::new(BASE_TILE_ID)
    }
}

impl TileIdAllocator {
    /// Resumes from a persisted counter; values below the base are raised to it.
    pub fn new(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next.max(BASE_TILE_ID)),
        }
    }

    /// Reserves `count` consecutive ids.
    pub fn allocate(&self, count: u64) -> Range<u64> {
        let start = self.next.fetch_add(count, Ordering::SeqCst);
        start..start + count
    }

    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Moves the counter forward to at least `next`, never backwards.
    pub fn advance_to(&self, next: u64) {
        self.next.fetch_max(next, Ordering::SeqCst);
    }
}
