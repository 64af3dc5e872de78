//! Limit Evaluator
//!
//! Compares the kind's decision statistic (`min` for time, `max` for
//! memory) and its relative counterpart against the caller's thresholds.
//! Both thresholds may be set; then both must hold.

use crate::benchmark::AggregatedResult;
use crate::error::{ConfigError, FailedLimit, LimitViolation, PerfError};
use crate::kind::{FunctionId, MeasurementKind};
use perftest_stats::Statistic;
use serde::{Deserialize, Serialize};

/// Which threshold of a [`Limit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Absolute threshold (seconds or MB)
    Raw,
    /// Threshold on the ratio to the baseline
    Relative,
}

impl Threshold {
    /// Name as reported
    pub fn name(self) -> &'static str {
        match self {
            Threshold::Raw => "raw_limit",
            Threshold::Relative => "relative_limit",
        }
    }
}

/// Raw and/or relative upper bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    /// Bound on the raw decision statistic
    pub raw: Option<f64>,
    /// Bound on the relative decision statistic
    pub relative: Option<f64>,
}

impl Limit {
    /// Raw threshold only
    pub fn raw(limit: f64) -> Self {
        Self {
            raw: Some(limit),
            relative: None,
        }
    }

    /// Relative threshold only
    pub fn relative(limit: f64) -> Self {
        Self {
            raw: None,
            relative: Some(limit),
        }
    }

    /// Add a raw threshold
    pub fn and_raw(mut self, limit: f64) -> Self {
        self.raw = Some(limit);
        self
    }

    /// Add a relative threshold
    pub fn and_relative(mut self, limit: f64) -> Self {
        self.relative = Some(limit);
        self
    }

    /// At least one finite threshold must be set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.raw.is_none() && self.relative.is_none() {
            return Err(ConfigError::new(
                "a limit needs `raw_limit`, `relative_limit`, or both",
            ));
        }
        for (threshold, value) in self.thresholds() {
            if !value.is_finite() {
                return Err(ConfigError::new(format!(
                    "`{}` must be a finite number, got {}",
                    threshold.name(),
                    value
                )));
            }
        }
        Ok(())
    }

    /// Configured thresholds, raw first
    pub fn thresholds(&self) -> impl Iterator<Item = (Threshold, f64)> + '_ {
        [
            self.raw.map(|v| (Threshold::Raw, v)),
            self.relative.map(|v| (Threshold::Relative, v)),
        ]
        .into_iter()
        .flatten()
    }
}

/// One threshold compared against its statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredValue {
    /// Threshold compared
    pub threshold: Threshold,
    /// Statistic it was compared against
    pub statistic: Statistic,
    /// Threshold value
    pub limit: f64,
    /// Measured statistic value
    pub measured: f64,
    /// `measured <= limit`
    pub passed: bool,
}

/// Result of a limit check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Measured function
    pub function: FunctionId,
    /// Qualified name of the checking function
    pub checker: String,
    /// What was measured
    pub kind: MeasurementKind,
    /// Thresholds checked
    pub limit: Limit,
    /// Every threshold with its measured statistic
    pub measured: Vec<MeasuredValue>,
    /// All thresholds held
    pub passed: bool,
    /// Significant digits for printing
    pub digits: usize,
}

/// Check `result` against `limit`.
///
/// Returns the passed evaluation, or the kind-specific limit error carrying
/// every failed threshold.
pub fn evaluate(
    result: &AggregatedResult,
    limit: &Limit,
    checker: &str,
    digits: usize,
) -> Result<Evaluation, PerfError> {
    limit.validate()?;

    let kind = result.kind();
    let statistic = kind.primary_statistic();
    let mut measured = Vec::with_capacity(2);

    for (threshold, value) in limit.thresholds() {
        let actual = match threshold {
            Threshold::Raw => result.primary(),
            Threshold::Relative => result.primary_relative().ok_or_else(|| {
                ConfigError::new(format!(
                    "`relative_limit` given for `{}` but no baseline is configured",
                    result.function()
                ))
            })?,
        };
        measured.push(MeasuredValue {
            threshold,
            statistic,
            limit: value,
            measured: actual,
            passed: actual <= value,
        });
    }

    let failures: Vec<FailedLimit> = measured
        .iter()
        .filter(|m| !m.passed)
        .map(|m| FailedLimit {
            threshold: m.threshold,
            statistic: m.statistic,
            limit: m.limit,
            measured: m.measured,
        })
        .collect();

    if !failures.is_empty() {
        tracing::debug!(function = %result.function(), checker, %kind, "limit violated");
        return Err(PerfError::from_violation(LimitViolation {
            function: result.function().clone(),
            checker: checker.to_string(),
            kind,
            failures,
            digits,
        }));
    }

    Ok(Evaluation {
        function: result.function().clone(),
        checker: checker.to_string(),
        kind,
        limit: *limit,
        measured,
        passed: true,
        digits,
    })
}
