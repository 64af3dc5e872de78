//! Collection-building checks

use crate::workloads::{build_btree_map, build_hash_map, fill_vec, join_words};
use perftest::MemLog;
use perftest::prelude::*;

#[perftest]
fn perftest_fill_vec_memory(ctx: &mut CheckContext<'_>) -> CheckResult {
    // 1M u64 = 8 MB
    ctx.memory_usage_test(fill_vec, (1_000_000usize,), Limit::raw(10.0))?;
    Ok(())
}

#[perftest]
fn perftest_maps(ctx: &mut CheckContext<'_>) -> CheckResult {
    ctx.set_defaults(MeasurementKind::Time, Params::new().number(20))?;

    let hash = ctx.time_benchmark(build_hash_map, (10_000usize,))?;
    let btree = ctx.time_benchmark(build_btree_map, (10_000usize,))?;
    print_timings(&[("HashMap", hash.min()), ("BTreeMap", btree.min())]);

    ctx.time_test(build_hash_map, (10_000usize,), Limit::raw(5e-2))?;
    ctx.memory_usage_test(build_btree_map, (10_000usize,), Limit::raw(5.0))?;
    Ok(())
}

#[perftest]
fn perftest_join_words(ctx: &mut CheckContext<'_>) -> CheckResult {
    let words: &'static [&'static str] = &["alpha", "beta", "gamma", "delta"];
    ctx.time_test(join_words, (words, ", "), Limit::raw(1e-4))?;
    Ok(())
}

#[perftest]
fn perftest_memlog(ctx: &mut CheckContext<'_>) -> CheckResult {
    let mut log = MemLog::new();
    log.record("start");
    let data = fill_vec(500_000);
    log.record("after fill_vec(500_000)");
    drop(data);
    log.record("after drop");
    println!("{}", log.render(4));

    ctx.memory_usage_test(fill_vec, (500_000usize,), Limit::raw(5.0))?;
    Ok(())
}

fn print_timings(rows: &[(&str, f64)]) {
    for (name, seconds) in rows {
        println!("{:<10} {} s", name, perftest::pp(*seconds, 4));
    }
}
