//! perftest demo checks
//!
//! Run all checks: `cargo run -p perftest-demos -- demos/src`
//! Run one module: `cargo run -p perftest-demos -- demos/src/perftest_collections.rs`
//! List without running: `cargo run -p perftest-demos -- demos/src --dry-run`

mod perftest_collections;
mod perftest_math;
mod workloads;

#[global_allocator]
static GLOBAL: perftest::TrackingAllocator = perftest::TrackingAllocator;

fn main() {
    // All checks defined in the perftest_* modules are registered via inventory
    if let Err(e) = perftest::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
