#![warn(missing_docs)]
//! perftest core
//!
//! Everything a check needs at run time:
//! - [`SettingsStore`]: three-tier parameter resolution plus one-shot overrides
//! - Benchmark engine: [`time_benchmark`] / [`memory_usage_benchmark`]
//! - Limit evaluator: [`evaluate`] against a raw and/or relative [`Limit`]
//! - Samplers: wall-clock timing and heap-peak tracking via [`TrackingAllocator`]
//! - [`CheckDef`] registry filled by `#[perftest]`

mod allocator;
mod benchmark;
mod context;
mod error;
mod format;
mod kind;
mod limit;
mod log;
mod memlog;
mod sampler;
mod settings;

pub use allocator::{
    TrackingAllocator, allocation_count, is_tracking, live_bytes, peak_bytes, reset_peak,
};
pub use benchmark::{
    AggregatedResult, Measured, Named, RawSample, memory_usage_benchmark, named, time_benchmark,
};
pub use context::{CheckContext, Harness};
pub use error::{BaselineError, ConfigError, FailedLimit, LimitViolation, PerfError};
pub use format::pp;
pub use kind::{FunctionId, MeasurementKind};
pub use limit::{Evaluation, Limit, MeasuredValue, Threshold, evaluate};
pub use log::append_result_line;
pub use memlog::{MemLog, MemLogEntry, resident_set_mb};
pub use perftest_stats::{Aggregate, Statistic};
pub use sampler::{BYTES_PER_MB, HeapPeakSampler, MemorySampler, TimeSampler, Timer, WallClockSampler};
pub use settings::{
    Baseline, CallOverrides, DEFAULT_DIGITS_FOR_PRINTING, DEFAULT_LOG_FILE, DEFAULT_MEMORY_REPEAT,
    DEFAULT_NUMBER, DEFAULT_TIME_REPEAT, PARAM_NAMES, Params, ResolvedSettings, SettingValue,
    SettingsStore, builtin_defaults,
};

/// Name prefix shared by check modules and check functions
pub const CHECK_PREFIX: &str = "perftest_";

/// Error type returned by check functions.
///
/// A [`PerfError`] converts into it with `?`, as does any other error; the
/// runner recovers the structured fields of a `PerfError` by downcasting.
pub type CheckError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of check functions
pub type CheckResult = Result<(), CheckError>;

/// Check function registered via `#[perftest]`
#[derive(Debug, Clone)]
pub struct CheckDef {
    /// Function name
    pub name: &'static str,
    /// Module path of the defining module
    pub module_path: &'static str,
    /// Source file path, as given by `file!()`
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Function pointer to the wrapper
    pub runner_fn: fn(&mut CheckContext<'_>) -> CheckResult,
}

impl CheckDef {
    /// `module::path::function`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module_path, self.name)
    }

    /// Whether the function name follows the check naming convention
    pub fn has_check_name(&self) -> bool {
        self.name.starts_with(CHECK_PREFIX)
    }
}

// Collect all registered checks
inventory::collect!(CheckDef);

/// All registered checks, in link order (unsorted)
pub fn registered_checks() -> Vec<&'static CheckDef> {
    inventory::iter::<CheckDef>.into_iter().collect()
}

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<CheckDef> {}
};

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut CheckContext<'_>) -> CheckResult {
        Ok(())
    }

    #[test]
    fn test_check_def_names() {
        let def = CheckDef {
            name: "perftest_sum",
            module_path: "demos::perftest_math",
            file: "demos/src/perftest_math.rs",
            line: 12,
            runner_fn: noop,
        };
        assert_eq!(def.qualified_name(), "demos::perftest_math::perftest_sum");
        assert!(def.has_check_name());

        let helper = CheckDef {
            name: "helper",
            ..def
        };
        assert!(!helper.has_check_name());
    }

    #[test]
    fn test_check_error_from_perf_error() {
        fn failing() -> CheckResult {
            Err(PerfError::Config(ConfigError::new("bad")))?;
            Ok(())
        }
        let err = failing().unwrap_err();
        assert_eq!(
            err.downcast_ref::<PerfError>().map(|e| e.kind_name()),
            Some("ConfigError")
        );
    }
}
