//! Allocation Tracking
//!
//! A counting wrapper around the system allocator. Install it in the
//! benchmark binary to get per-step byte accounting:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: calibench::TrackingAllocator = calibench::TrackingAllocator;
//! ```
//!
//! Counters are process-wide and only ever grow. A measurement takes an
//! [`AllocSnapshot`] when its timer starts and diffs against it when the
//! timer stops, so nested snapshots never interfere with each other.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);
static FREED_BYTES: AtomicU64 = AtomicU64::new(0);
static ALLOCATION_COUNT: AtomicU64 = AtomicU64::new(0);

/// Relative difference under which two live-heap snapshots count as settled.
pub const SETTLE_TOLERANCE: f64 = 0.25;

/// Upper bound on settle rounds before giving up.
pub const MAX_SETTLE_ROUNDS: usize = 10;

/// Global allocator that counts allocated and freed bytes.
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded verbatim to the system allocator.
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            ALLOCATED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
            ALLOCATION_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        FREED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        // SAFETY: `ptr` was produced by `alloc` above with the same layout.
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded verbatim to the system allocator.
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            ALLOCATED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
            ALLOCATION_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: caller upholds the `GlobalAlloc::realloc` contract.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            FREED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
            ALLOCATED_BYTES.fetch_add(new_size as u64, Ordering::Relaxed);
            ALLOCATION_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        new_ptr
    }
}

/// Point-in-time copy of the process-wide allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocSnapshot {
    /// Total bytes ever allocated
    pub allocated: u64,
    /// Total bytes ever freed
    pub freed: u64,
    /// Total allocation calls
    pub count: u64,
}

impl AllocSnapshot {
    /// Read the current counters
    #[inline]
    pub fn now() -> Self {
        Self {
            allocated: ALLOCATED_BYTES.load(Ordering::Relaxed),
            freed: FREED_BYTES.load(Ordering::Relaxed),
            count: ALLOCATION_COUNT.load(Ordering::Relaxed),
        }
    }

    /// Bytes currently live on the heap (as far as the tracker has seen).
    pub fn live_bytes(&self) -> u64 {
        self.allocated.saturating_sub(self.freed)
    }

    /// Net bytes and allocation count between `earlier` and `self`.
    ///
    /// Net bytes may be negative when the interval frees more than it allocates.
    pub fn delta_since(&self, earlier: &AllocSnapshot) -> (i64, u64) {
        let allocated = self.allocated.wrapping_sub(earlier.allocated) as i64;
        let freed = self.freed.wrapping_sub(earlier.freed) as i64;
        (allocated - freed, self.count.wrapping_sub(earlier.count))
    }
}

/// Current totals as `(allocated bytes, allocation count)`.
pub fn current_allocation() -> (u64, u64) {
    let snap = AllocSnapshot::now();
    (snap.allocated, snap.count)
}

/// Whether the tracking allocator has observed any allocation at all.
///
/// `false` almost always means [`TrackingAllocator`] is not installed.
pub fn tracking_active() -> bool {
    ALLOCATION_COUNT.load(Ordering::Relaxed) > 0
}

/// Wait for the live heap to stop moving before a measurement.
///
/// Takes live-heap snapshots with a short pause in between until two
/// consecutive readings differ by less than [`SETTLE_TOLERANCE`]. Deferred
/// frees from the previous worker thread land here instead of in the next
/// step's byte count. Returns the number of rounds taken.
pub fn settle_heap() -> usize {
    let mut previous = AllocSnapshot::now().live_bytes();
    for round in 1..=MAX_SETTLE_ROUNDS {
        std::thread::yield_now();
        std::thread::sleep(Duration::from_micros(50));
        let current = AllocSnapshot::now().live_bytes();
        if is_settled(previous, current) {
            return round;
        }
        previous = current;
    }
    MAX_SETTLE_ROUNDS
}

fn is_settled(previous: u64, current: u64) -> bool {
    let larger = previous.max(current);
    if larger == 0 {
        return true;
    }
    let diff = previous.abs_diff(current) as f64;
    diff / (larger as f64) < SETTLE_TOLERANCE
}
