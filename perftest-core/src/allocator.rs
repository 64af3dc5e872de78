//! Global Allocator Interceptor
//!
//! Tracks live heap bytes and their high-water mark. Install it in the
//! binary that runs memory checks:
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: perftest::TrackingAllocator = perftest::TrackingAllocator;
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static PEAK_BYTES: AtomicU64 = AtomicU64::new(0);
static ALLOCATION_COUNT: AtomicU64 = AtomicU64::new(0);
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Tracking allocator that wraps the system allocator
pub struct TrackingAllocator;

#[inline]
fn record_grow(bytes: u64) {
    let live = LIVE_BYTES.fetch_add(bytes, Ordering::Relaxed) + bytes;
    PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
    ALLOCATION_COUNT.fetch_add(1, Ordering::Relaxed);
    if !ACTIVE.load(Ordering::Relaxed) {
        ACTIVE.store(true, Ordering::Relaxed);
    }
}

#[inline]
fn record_shrink(bytes: u64) {
    // Saturate: memory handed out before the allocator was installed may be freed through it
    let _ = LIVE_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
        Some(live.saturating_sub(bytes))
    });
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: Delegates to the system allocator with the provided layout.
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record_grow(layout.size() as u64);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: Pointer/layout are provided by corresponding allocation operations.
        unsafe { System.dealloc(ptr, layout) };
        record_shrink(layout.size() as u64);
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: Delegates to the system allocator with the provided layout.
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_grow(layout.size() as u64);
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: Pointer/layout originate from allocator contracts; new_size is caller-provided.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size > layout.size() {
                record_grow((new_size - layout.size()) as u64);
            } else {
                record_shrink((layout.size() - new_size) as u64);
            }
        }
        new_ptr
    }
}

/// Heap bytes currently allocated
pub fn live_bytes() -> u64 {
    LIVE_BYTES.load(Ordering::Relaxed)
}

/// Highest `live_bytes()` since the last [`reset_peak`]
pub fn peak_bytes() -> u64 {
    PEAK_BYTES.load(Ordering::Relaxed)
}

/// Total allocation calls observed
pub fn allocation_count() -> u64 {
    ALLOCATION_COUNT.load(Ordering::Relaxed)
}

/// Restart peak tracking from the current live size
pub fn reset_peak() {
    PEAK_BYTES.store(LIVE_BYTES.load(Ordering::Relaxed), Ordering::Relaxed);
}

/// Whether `TrackingAllocator` has seen any allocation, i.e. is installed
pub fn is_tracking() -> bool {
    ACTIVE.load(Ordering::Relaxed)
}

// Allocation behavior is covered by perftest/tests/integration.rs, which
// installs TrackingAllocator as #[global_allocator].
