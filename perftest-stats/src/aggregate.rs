//! Summary Aggregation
//!
//! Every statistic is computed from ALL samples. There is no outlier
//! rejection: a single slow repeat is exactly the signal a memory check
//! (which looks at `max`) must not lose.

use crate::StatsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which aggregate a decision is based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Smallest sample
    Min,
    /// Arithmetic mean
    Mean,
    /// Largest sample
    Max,
}

impl Statistic {
    /// Name used in messages and reports
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Min => "min",
            Statistic::Mean => "mean",
            Statistic::Max => "max",
        }
    }

    /// Name of the baseline-relative counterpart (`min_relative`, ...)
    pub fn relative_name(self) -> &'static str {
        match self {
            Statistic::Min => "min_relative",
            Statistic::Mean => "mean_relative",
            Statistic::Max => "max_relative",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// min/mean/max over one raw sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Smallest sample
    pub min: f64,
    /// Arithmetic mean of all samples
    pub mean: f64,
    /// Largest sample
    pub max: f64,
}

impl Aggregate {
    /// Look up one statistic
    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Min => self.min,
            Statistic::Mean => self.mean,
            Statistic::Max => self.max,
        }
    }
}

/// Aggregate a raw sample into min/mean/max
pub fn aggregate(samples: &[f64]) -> Result<Aggregate, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptySamples);
    }

    let min = samples
        .iter()
        .cloned()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(0.0);
    let max = samples
        .iter()
        .cloned()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(0.0);
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;

    Ok(Aggregate { min, mean, max })
}
