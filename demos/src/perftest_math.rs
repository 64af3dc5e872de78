//! Arithmetic checks

use crate::workloads::{sum_squares, sum_values};
use perftest::prelude::*;

#[perftest]
fn perftest_sum_values(ctx: &mut CheckContext<'_>) -> CheckResult {
    ctx.time_test(sum_values, (1_000u64,), Limit::raw(1e-4))?;
    Ok(())
}

/// Fewer invocations for the slower workload; every later call sees them.
#[perftest]
fn perftest_sum_squares(ctx: &mut CheckContext<'_>) -> CheckResult {
    ctx.set(&sum_squares, MeasurementKind::Time, Params::new().number(200))?;
    ctx.time_test(sum_squares, (10_000u64,), Limit::raw(1e-3))?;

    // One extra repeat-group for this call only
    ctx.time_test_with(
        sum_squares,
        (10_000u64,),
        Limit::raw(1e-3),
        CallOverrides::none().repeat(7),
    )?;
    Ok(())
}

/// Portable limit: at most 5x the standard baseline
#[perftest]
fn perftest_sum_relative(ctx: &mut CheckContext<'_>) -> CheckResult {
    ctx.set(
        &sum_values,
        MeasurementKind::Time,
        Params::new().baseline(Baseline::standard()).number(100),
    )?;
    ctx.time_test(sum_values, (100_000u64,), Limit::relative(5.0).and_raw(1e-2))?;
    Ok(())
}

/// Deliberately impossible, to show a failure report
#[perftest]
fn perftest_impossible_limit(ctx: &mut CheckContext<'_>) -> CheckResult {
    ctx.time_test(
        named("demos::closure_sum", |n: u64| (0..n).rev().sum::<u64>()),
        (50_000u64,),
        Limit::raw(1e-12),
    )?;
    Ok(())
}
