//! Integration tests for perftest
//!
//! These run with `TrackingAllocator` installed, so memory checks measure
//! real heap peaks. Tests share the global counters, so memory assertions
//! use lower bounds only.

use perftest::prelude::*;
use perftest::{
    DiscoveredCheck, Evaluation, Harness, HeapPeakSampler, MemLog, MemorySampler, OutcomeStatus,
    SettingsStore, Statistic, is_tracking, registered_checks,
};
use std::hint::black_box;
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

fn sum_values(n: u64) -> u64 {
    (0..n).sum()
}

fn allocate_mb(mb: usize) -> usize {
    let buffer = vec![1u8; mb * 1_000_000];
    black_box(&buffer);
    buffer.len()
}

fn quick() -> CallOverrides {
    CallOverrides::none().number(100).repeat(3)
}

#[test]
fn test_heap_peak_sampler_sees_allocation() {
    let mut sampler = HeapPeakSampler::new();
    assert!(sampler.ensure_ready().is_ok());
    let mut f = || {
        allocate_mb(4);
    };
    let peak = sampler.sample_peak(&mut f);
    assert!(is_tracking());
    assert!(peak >= 4.0, "peak {} MB", peak);
}

#[test]
fn test_time_test_passes() {
    let evaluation = perftest::time_test_with(sum_values, (100u64,), Limit::raw(1.0), quick()).unwrap();
    assert!(evaluation.passed);
    assert_eq!(evaluation.kind, MeasurementKind::Time);
    assert_eq!(evaluation.measured[0].statistic, Statistic::Min);
}

#[test]
fn test_time_test_violation() {
    let err = perftest::time_test_with(sum_values, (100u64,), Limit::raw(0.0), quick()).unwrap_err();
    let violation = match &err {
        PerfError::TimeTest(v) => v,
        other => panic!("expected TimeTest, got {:?}", other),
    };
    assert_eq!(violation.failures.len(), 1);
    assert!(violation.failures[0].measured > 0.0);
    assert!(err.to_string().contains("raw_limit = 0"));
}

#[test]
fn test_memory_usage_test_violation() {
    let err = perftest::memory_usage_test(allocate_mb, (5usize,), Limit::raw(1.0)).unwrap_err();
    match err {
        PerfError::MemoryTest(v) => {
            assert_eq!(v.failures[0].statistic, Statistic::Max);
            assert!(v.failures[0].measured >= 5.0, "measured {}", v.failures[0].measured);
        }
        other => panic!("expected MemoryTest, got {:?}", other),
    }
}

#[test]
fn test_memory_usage_test_passes() {
    let evaluation: Evaluation =
        perftest::memory_usage_test(allocate_mb, (1usize,), Limit::raw(1000.0)).unwrap();
    assert!(evaluation.passed);
    assert!(evaluation.measured[0].measured >= 1.0);
}

#[test]
fn test_checker_defaults_to_test_name() {
    let evaluation = perftest::time_test_with(sum_values, (10u64,), Limit::raw(1.0), quick()).unwrap();
    assert!(
        evaluation.checker.ends_with("test_checker_defaults_to_test_name"),
        "checker was {}",
        evaluation.checker
    );
}

#[test]
fn test_standard_baseline_relative() {
    let mut harness = Harness::new(SettingsStore::new());
    harness
        .settings_mut()
        .set_defaults(
            MeasurementKind::Time,
            Params::new().number(10).repeat(3).baseline(Baseline::standard()),
        )
        .unwrap();
    harness
        .settings_mut()
        .set_defaults(MeasurementKind::Memory, Params::new().baseline(Baseline::standard()))
        .unwrap();

    let mut ctx = harness.context("integration::relative");
    let time = ctx.time_benchmark(sum_values, (1000u64,)).unwrap();
    assert_eq!(time.baseline(), Some("standard"));
    assert_eq!(time.samples().len(), 3);
    assert!(time.min_relative().is_some_and(|r| r > 0.0));

    let memory = ctx.memory_usage_benchmark(allocate_mb, (4usize,)).unwrap();
    assert!(memory.max_relative().is_some_and(|r| r > 0.0));

    let evaluation = ctx
        .time_test(sum_values, (1000u64,), Limit::relative(1e9))
        .unwrap();
    assert_eq!(evaluation.measured[0].statistic, Statistic::Min);
    assert_eq!(ctx.evaluations().len(), 1);
}

#[test]
fn test_relative_limit_without_baseline() {
    let err = perftest::time_test(sum_values, (10u64,), Limit::relative(2.0)).unwrap_err();
    assert_eq!(err.kind_name(), "ConfigError");
}

#[test]
fn test_named_target_identity() {
    let evaluation = perftest::time_test_with(
        named("sum::closure", |n: u64| (0..n).product::<u64>()),
        (5u64,),
        Limit::raw(1.0),
        quick(),
    )
    .unwrap();
    assert_eq!(evaluation.function.as_str(), "sum::closure");
}

#[test]
fn test_memlog_tracks_heap() {
    let mut log = MemLog::new();
    let buffer = vec![7u8; 2_000_000];
    let entry = log.record("after buffer").clone();
    black_box(&buffer);
    assert!(entry.heap_mb >= 2.0);
    assert!(log.render(4).contains("after buffer"));
}

// Registered checks

#[perftest]
fn perftest_registered_unit(ctx: &mut CheckContext<'_>) {
    let _ = ctx.time_test_with(sum_values, (10u64,), Limit::raw(1.0), quick());
}

#[perftest]
fn perftest_registered_result(ctx: &mut CheckContext<'_>) -> Result<(), PerfError> {
    ctx.memory_usage_test(allocate_mb, (3usize,), Limit::raw(0.5))?;
    Ok(())
}

#[test]
fn test_macro_registration() {
    let ours: Vec<_> = registered_checks()
        .into_iter()
        .filter(|def| def.file.ends_with("integration.rs"))
        .collect();
    assert_eq!(ours.len(), 2);
    for def in &ours {
        assert!(def.has_check_name());
        assert!(def.module_path.starts_with("integration"));
        assert!(def.line > 0);
    }
}

#[test]
fn test_session_over_registered_checks() {
    let mut checks: Vec<_> = registered_checks()
        .into_iter()
        .filter(|def| def.file.ends_with("integration.rs"))
        .map(|def| DiscoveredCheck {
            module: PathBuf::from(def.file),
            def,
        })
        .collect();
    checks.sort_by_key(|c| c.def.line);

    let mut session = perftest::Session::new(SettingsStore::new(), ".").with_checks(checks);
    session.run();
    let report = session.summarize();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.passed, 1);
    let failed = &report.outcomes[1];
    assert!(failed.check.ends_with("perftest_registered_result"));
    match &failed.status {
        OutcomeStatus::LimitViolated(v) => assert!(v.failures[0].measured >= 3.0),
        other => panic!("expected LimitViolated, got {:?}", other),
    }
    assert!(perftest::format_human_output(&report).contains("Out of 2 tests, 1 passed and 1 failed"));
}
