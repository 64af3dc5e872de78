//! Samplers
//!
//! The engine owns the repeat loop; a sampler measures exactly one
//! repeat-group per call. This keeps `RawSample.len() == repeat` true for
//! any sampler implementation.

use crate::allocator::{is_tracking, peak_bytes, reset_peak};
use crate::error::ConfigError;
use std::time::{Duration, Instant};

/// Bytes per MB (decimal megabytes)
pub const BYTES_PER_MB: f64 = 1_000_000.0;

/// Measures execution time
pub trait TimeSampler {
    /// Run `f` `number` times and return the per-invocation cost in seconds
    fn sample_group(&mut self, f: &mut dyn FnMut(), number: u64) -> f64;
}

/// Measures peak memory use
pub trait MemorySampler {
    /// Run `f` once and return the peak memory observed while it ran, in MB
    fn sample_peak(&mut self, f: &mut dyn FnMut()) -> f64;

    /// Fails when samples would not reflect real memory use
    fn ensure_ready(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Timer for measuring repeat-groups
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed since `start`
    #[inline(always)]
    pub fn stop(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Monotonic wall-clock sampler
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClockSampler;

impl TimeSampler for WallClockSampler {
    fn sample_group(&mut self, f: &mut dyn FnMut(), number: u64) -> f64 {
        let number = number.max(1);
        let timer = Timer::start();
        for _ in 0..number {
            f();
        }
        timer.stop().as_secs_f64() / number as f64
    }
}

/// Peak live heap, as seen by [`crate::TrackingAllocator`]
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapPeakSampler;

impl HeapPeakSampler {
    /// Create a sampler
    pub fn new() -> Self {
        Self
    }
}

impl MemorySampler for HeapPeakSampler {
    fn sample_peak(&mut self, f: &mut dyn FnMut()) -> f64 {
        reset_peak();
        f();
        peak_bytes() as f64 / BYTES_PER_MB
    }

    fn ensure_ready(&self) -> Result<(), ConfigError> {
        if !is_tracking() {
            return Err(ConfigError::new(
                "memory cannot be measured: install TrackingAllocator as #[global_allocator] \
                 in the binary running memory checks",
            ));
        }
        Ok(())
    }
}
