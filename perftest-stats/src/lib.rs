#![warn(missing_docs)]
//! perftest statistics
//!
//! A performance check looks at the minimum, mean and maximum of a
//! handful of repeat-groups, optionally divided pointwise by a co-measured
//! baseline.
//!
//! - [`aggregate`] - min/mean/max over a raw sample
//! - [`relative_ratios`] - pointwise target/baseline ratios

mod aggregate;
mod relative;

pub use aggregate::{Aggregate, Statistic, aggregate};
pub use relative::relative_ratios;

/// Errors from statistics computation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    /// Nothing to aggregate
    #[error("Cannot aggregate an empty sample")]
    EmptySamples,

    /// Target and baseline were sampled a different number of times
    #[error("Target has {target} samples but baseline has {baseline}")]
    LengthMismatch {
        /// Target sample count
        target: usize,
        /// Baseline sample count
        baseline: usize,
    },

    /// A baseline sample was zero (or not finite), so no ratio exists
    #[error("Baseline sample {index} is {value}; relative ratio is undefined")]
    ZeroBaseline {
        /// Position of the offending sample
        index: usize,
        /// The offending value
        value: f64,
    },
}
