#![warn(missing_docs)]
//! # perftest
//!
//! Checks that a function's execution time or peak memory stays within a
//! limit, and runs batches of such checks from the command line.
//!
//! - **Layered settings**: built-in defaults, global overrides, per-function
//!   overrides, and one-shot per-call overrides
//! - **Raw and relative limits**: compare against seconds / MB, or against
//!   the ratio to a baseline workload measured alongside the target
//! - **Discovery**: `#[perftest]` functions in `perftest_*.rs` modules run
//!   in one session, each isolated from the others' failures
//! - **Reports**: failure detail plus a tally, as text or JSON
//!
//! ## Quick Start
//!
//! ```ignore
//! use perftest::prelude::*;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator;
//!
//! fn sum_values(n: u64) -> u64 {
//!     (0..n).sum()
//! }
//!
//! #[perftest]
//! fn perftest_sum(ctx: &mut CheckContext<'_>) -> CheckResult {
//!     ctx.set(&sum_values, MeasurementKind::Time, Params::new().number(1000))?;
//!     ctx.time_test(sum_values, (1000u64,), Limit::raw(1e-4))?;
//!     ctx.memory_usage_test(sum_values, (1000u64,), Limit::raw(1.0))?;
//!     Ok(())
//! }
//!
//! fn main() {
//!     if let Err(e) = perftest::run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```
//!
//! ## Inside `#[test]`
//!
//! ```ignore
//! #[test]
//! fn sum_is_fast() {
//!     perftest::time_test(sum_values, (1000u64,), Limit::raw(1e-4)).unwrap();
//! }
//! ```

// Re-export core types
pub use perftest_core::{
    AggregatedResult, Baseline, BaselineError, CHECK_PREFIX, CallOverrides, CheckContext,
    CheckDef, CheckError, CheckResult, ConfigError, Evaluation, FailedLimit, FunctionId,
    HeapPeakSampler, Harness, Limit, LimitViolation, MeasuredValue, Measured, MeasurementKind,
    MemLog, MemLogEntry, MemorySampler, Named, Params, PerfError, RawSample, ResolvedSettings,
    SettingValue, SettingsStore, Threshold, TimeSampler, Timer, TrackingAllocator,
    WallClockSampler, allocation_count, evaluate, is_tracking, live_bytes,
    memory_usage_benchmark, named, peak_bytes, pp, registered_checks, reset_peak,
    resident_set_mb, time_benchmark,
};

// Re-export stats
pub use perftest_stats::{Aggregate, Statistic, StatsError};

// Re-export report types
pub use perftest_report::{
    CheckOutcome, ErrorInfo, OutcomeStatus, OutputFormat, ReportSummary, SessionReport,
    format_human_output, generate_json_report,
};

// Re-export runner
pub use perftest_cli::{
    DiscoveredCheck, DiscoveryError, PerftestConfig, Session, SessionState, run_session,
};

// Re-export macros
pub use perftest_macros::perftest;

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Baseline, CallOverrides, CheckContext, CheckResult, Limit, MeasurementKind, Params,
        PerfError, TrackingAllocator, named, perftest,
    };
}

/// Run the perftest CLI.
///
/// Call this from the `main()` of the binary holding the check modules:
/// ```ignore
/// fn main() {
///     perftest::run().unwrap();
/// }
/// ```
pub use perftest_cli::run;

/// Checker identity for calls made outside a session: the current thread
/// name, which `cargo test` sets to the test path.
fn current_checker() -> String {
    std::thread::current()
        .name()
        .unwrap_or("main")
        .to_string()
}

/// Assert that `target(args)` runs within `limit`, using default settings.
///
/// Each call uses a fresh settings store, so nothing leaks between tests.
/// A violated limit comes back as [`PerfError::TimeTest`].
pub fn time_test<F, Args>(target: F, args: Args, limit: Limit) -> Result<Evaluation, PerfError>
where
    F: Measured<Args>,
{
    time_test_with(target, args, limit, CallOverrides::none())
}

/// [`time_test`] with one-shot `number`/`repeat` overrides
pub fn time_test_with<F, Args>(
    target: F,
    args: Args,
    limit: Limit,
    overrides: CallOverrides,
) -> Result<Evaluation, PerfError>
where
    F: Measured<Args>,
{
    let mut harness = Harness::default();
    harness
        .context(current_checker())
        .time_test_with(target, args, limit, overrides)
}

/// Assert that `target(args)` peaks within `limit` MB, using default settings.
///
/// Needs [`TrackingAllocator`] installed as the global allocator; without
/// it the call fails with [`PerfError::Config`].
pub fn memory_usage_test<F, Args>(
    target: F,
    args: Args,
    limit: Limit,
) -> Result<Evaluation, PerfError>
where
    F: Measured<Args>,
{
    memory_usage_test_with(target, args, limit, CallOverrides::none())
}

/// [`memory_usage_test`] with a one-shot `repeat` override
pub fn memory_usage_test_with<F, Args>(
    target: F,
    args: Args,
    limit: Limit,
    overrides: CallOverrides,
) -> Result<Evaluation, PerfError>
where
    F: Measured<Args>,
{
    let mut harness = Harness::default();
    harness
        .context(current_checker())
        .memory_usage_test_with(target, args, limit, overrides)
}
