//! Error taxonomy
//!
//! [`PerfError`] is the only error type that leaves the core:
//! - `TimeTest` / `MemoryTest`: a limit was violated (the expected way for a
//!   check to fail)
//! - `Config`: invalid settings or limits, fatal to one evaluation
//! - `Baseline`: relative measurement impossible, fatal to one evaluation

use crate::format::pp;
use crate::kind::{FunctionId, MeasurementKind};
use crate::limit::Threshold;
use perftest_stats::{Statistic, StatsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Invalid or missing configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    /// Create a configuration error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable description
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Relative measurement was impossible
#[derive(Debug, Clone, PartialEq, Error)]
#[error("baseline `{baseline}` unusable for `{function}`: {source}")]
pub struct BaselineError {
    /// Function whose relative statistics were requested
    pub function: FunctionId,
    /// Name of the configured baseline
    pub baseline: String,
    /// Underlying numeric failure
    pub source: StatsError,
}

/// One threshold that was not met
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedLimit {
    /// Which threshold failed
    pub threshold: Threshold,
    /// Aggregate it was compared against
    pub statistic: Statistic,
    /// Threshold value
    pub limit: f64,
    /// Measured value of the statistic
    pub measured: f64,
}

impl FailedLimit {
    /// Statistic name as reported (`min`, `max_relative`, ...)
    pub fn statistic_name(&self) -> &'static str {
        match self.threshold {
            Threshold::Raw => self.statistic.name(),
            Threshold::Relative => self.statistic.relative_name(),
        }
    }
}

/// Structured details of a violated limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitViolation {
    /// Measured function
    pub function: FunctionId,
    /// Qualified name of the checking function
    pub checker: String,
    /// What was measured
    pub kind: MeasurementKind,
    /// Every threshold that failed (at least one)
    pub failures: Vec<FailedLimit>,
    /// Significant digits used when printing values
    pub digits: usize,
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` (checked by `{}`)", self.function, self.checker)?;
        for failure in &self.failures {
            let unit = match failure.threshold {
                Threshold::Raw => self.kind.unit(),
                Threshold::Relative => "",
            };
            write!(
                f,
                "; {} = {}, {} = {}{}",
                failure.threshold.name(),
                pp(failure.limit, self.digits),
                failure.statistic_name(),
                pp(failure.measured, self.digits),
                unit
            )?;
        }
        Ok(())
    }
}

/// Errors raised across the core boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PerfError {
    /// A time limit was violated
    #[error("Time test not passed: {0}")]
    TimeTest(LimitViolation),

    /// A memory limit was violated
    #[error("Memory test not passed: {0}")]
    MemoryTest(LimitViolation),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Relative measurement impossible
    #[error("Baseline error: {0}")]
    Baseline(#[from] BaselineError),
}

impl PerfError {
    /// Name of the error kind, as shown in reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            PerfError::TimeTest(_) => "TimeTestError",
            PerfError::MemoryTest(_) => "MemoryTestError",
            PerfError::Config(_) => "ConfigError",
            PerfError::Baseline(_) => "BaselineError",
        }
    }

    /// Limit details, if this is a limit violation
    pub fn violation(&self) -> Option<&LimitViolation> {
        match self {
            PerfError::TimeTest(v) | PerfError::MemoryTest(v) => Some(v),
            _ => None,
        }
    }

    /// Wrap a violation in the kind-specific variant
    pub fn from_violation(violation: LimitViolation) -> Self {
        match violation.kind {
            MeasurementKind::Time => PerfError::TimeTest(violation),
            MeasurementKind::Memory => PerfError::MemoryTest(violation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(kind: MeasurementKind) -> LimitViolation {
        LimitViolation {
            function: FunctionId::new("demo::sum_values"),
            checker: "demo::perftest_sum".to_string(),
            kind,
            failures: vec![FailedLimit {
                threshold: Threshold::Raw,
                statistic: kind.primary_statistic(),
                limit: 0.01,
                measured: 0.1,
            }],
            digits: 4,
        }
    }

    #[test]
    fn test_from_violation_picks_kind() {
        assert_eq!(
            PerfError::from_violation(violation(MeasurementKind::Time)).kind_name(),
            "TimeTestError"
        );
        assert_eq!(
            PerfError::from_violation(violation(MeasurementKind::Memory)).kind_name(),
            "MemoryTestError"
        );
    }

    #[test]
    fn test_violation_message() {
        let err = PerfError::from_violation(violation(MeasurementKind::Time));
        let msg = err.to_string();
        assert!(msg.starts_with("Time test not passed"));
        assert!(msg.contains("demo::perftest_sum"));
        assert!(msg.contains("raw_limit = 0.01"));
        assert!(msg.contains("min = 0.1s"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: PerfError = ConfigError::new("repeat must be at least 1").into();
        assert_eq!(err.kind_name(), "ConfigError");
        assert!(err.violation().is_none());
    }
}
