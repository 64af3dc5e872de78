//! Report Data Structures

use chrono::{DateTime, Utc};
use perftest_core::{Evaluation, LimitViolation, PerfError};
use serde::{Deserialize, Serialize};

/// Everything one runner invocation produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub meta: ReportMeta,
    pub outcomes: Vec<CheckOutcome>,
    pub summary: ReportSummary,
}

impl SessionReport {
    /// Freeze a list of outcomes into a report
    pub fn new(meta: ReportMeta, outcomes: Vec<CheckOutcome>) -> Self {
        let summary = ReportSummary::from_outcomes(&outcomes);
        Self {
            meta,
            outcomes,
            summary,
        }
    }

    /// Outcomes that did not pass, in run order
    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_passed())
    }

    /// Whether every check passed
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Discovery root as given (or the working directory)
    pub root: String,
    pub os: String,
    pub arch: String,
}

impl ReportMeta {
    /// Metadata for a session started now
    pub fn now(root: impl Into<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            root: root.into(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Result of running one check function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Qualified name of the check function
    pub check: String,
    pub file: String,
    pub line: u32,
    /// Evaluations that passed before the check returned or failed
    pub evaluations: Vec<Evaluation>,
    pub status: OutcomeStatus,
    pub duration_ms: f64,
}

/// How a check ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Every evaluation held
    Passed,
    /// A time or memory limit was exceeded
    LimitViolated(LimitViolation),
    /// Configuration, baseline, panic or any other failure
    Errored(ErrorInfo),
}

impl OutcomeStatus {
    /// Whether the check passed
    pub fn is_passed(&self) -> bool {
        matches!(self, OutcomeStatus::Passed)
    }

    /// Error kind shown in reports (`TimeTestError`, `Panic`, ...)
    pub fn kind_name(&self) -> Option<&str> {
        match self {
            OutcomeStatus::Passed => None,
            OutcomeStatus::LimitViolated(v) => Some(match v.kind {
                perftest_core::MeasurementKind::Time => "TimeTestError",
                perftest_core::MeasurementKind::Memory => "MemoryTestError",
            }),
            OutcomeStatus::Errored(info) => Some(&info.kind),
        }
    }
}

impl From<&PerfError> for OutcomeStatus {
    fn from(err: &PerfError) -> Self {
        match err.violation() {
            Some(violation) => OutcomeStatus::LimitViolated(violation.clone()),
            None => OutcomeStatus::Errored(ErrorInfo::new(err.kind_name(), err.to_string())),
        }
    }
}

/// Failure without limit details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    /// Limit violations and errors
    pub failed: usize,
    /// Failures that were not limit violations
    pub errored: usize,
    pub passed_checks: Vec<String>,
    pub failed_checks: Vec<String>,
    pub total_duration_ms: f64,
}

impl ReportSummary {
    fn from_outcomes(outcomes: &[CheckOutcome]) -> Self {
        let mut summary = ReportSummary {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            summary.total_duration_ms += outcome.duration_ms;
            match &outcome.status {
                OutcomeStatus::Passed => {
                    summary.passed += 1;
                    summary.passed_checks.push(outcome.check.clone());
                }
                status => {
                    summary.failed += 1;
                    if matches!(status, OutcomeStatus::Errored(_)) {
                        summary.errored += 1;
                    }
                    summary.failed_checks.push(outcome.check.clone());
                }
            }
        }
        summary
    }
}
