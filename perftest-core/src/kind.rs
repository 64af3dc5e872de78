//! Measurement kinds and function identities

use perftest_stats::Statistic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What is being measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Per-invocation execution time, in seconds
    Time,
    /// Peak memory use, in MB
    Memory,
}

impl MeasurementKind {
    /// The aggregate a limit is compared against.
    ///
    /// Time uses the best observed cost (least scheduling noise); memory
    /// uses the worst observed peak.
    pub fn primary_statistic(self) -> Statistic {
        match self {
            MeasurementKind::Time => Statistic::Min,
            MeasurementKind::Memory => Statistic::Max,
        }
    }

    /// Lowercase name, as used in config files
    pub fn name(self) -> &'static str {
        match self {
            MeasurementKind::Time => "time",
            MeasurementKind::Memory => "memory",
        }
    }

    /// Unit of raw measurements
    pub fn unit(self) -> &'static str {
        match self {
            MeasurementKind::Time => "s",
            MeasurementKind::Memory => "MB",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeasurementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" => Ok(MeasurementKind::Time),
            "memory" => Ok(MeasurementKind::Memory),
            other => Err(format!("Unknown measurement kind: {}", other)),
        }
    }
}

/// Stable key for a measured function (its qualified name).
///
/// Used to index per-function settings. Distinct from the name of the
/// check that measures it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(String);

impl FunctionId {
    /// Identity from an explicit name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Identity of a value's type. For fn items this is the function's
    /// fully qualified path, e.g. `my_crate::parsing::parse_line`.
    pub fn of_val<F: ?Sized>(_: &F) -> Self {
        Self(std::any::type_name::<F>().to_string())
    }

    /// Whether this identity is shared by unrelated callables.
    ///
    /// Every closure in one function reports the same type path, and every
    /// fn pointer or trait object of one signature reports the same type, so
    /// neither can key per-function settings.
    pub fn is_anonymous(&self) -> bool {
        let name = self.0.as_str();
        name.contains("{{closure}}") || name.contains("fn(") || name.contains("dyn ")
    }

    /// Qualified name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment (`parse_line` for `my_crate::parsing::parse_line`)
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FunctionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FunctionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_values(n: u64) -> u64 {
        (0..n).sum()
    }

    #[test]
    fn test_primary_statistic() {
        assert_eq!(MeasurementKind::Time.primary_statistic(), Statistic::Min);
        assert_eq!(MeasurementKind::Memory.primary_statistic(), Statistic::Max);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("TIME".parse::<MeasurementKind>(), Ok(MeasurementKind::Time));
        assert_eq!("memory".parse::<MeasurementKind>(), Ok(MeasurementKind::Memory));
        assert!("cpu".parse::<MeasurementKind>().is_err());
    }

    #[test]
    fn test_function_id_of_fn_item() {
        let id = FunctionId::of_val(&sum_values);
        assert!(id.as_str().ends_with("kind::tests::sum_values"));
        assert_eq!(id.short_name(), "sum_values");
    }

    #[test]
    fn test_distinct_functions_distinct_ids() {
        fn other(n: u64) -> u64 {
            n
        }
        assert_ne!(FunctionId::of_val(&sum_values), FunctionId::of_val(&other));
    }

    #[test]
    fn test_closures_and_fn_pointers_are_anonymous() {
        let double = |n: u64| n * 2;
        let triple = |n: u64| n * 3;
        assert_eq!(FunctionId::of_val(&double), FunctionId::of_val(&triple));
        assert!(FunctionId::of_val(&double).is_anonymous());

        let pointer: fn(u64) -> u64 = sum_values;
        assert!(FunctionId::of_val(&pointer).is_anonymous());

        let boxed: Box<dyn Fn(u64) -> u64> = Box::new(sum_values);
        assert!(FunctionId::of_val(&boxed).is_anonymous());

        assert!(!FunctionId::of_val(&sum_values).is_anonymous());
        assert!(!FunctionId::new("demos::closure_sum").is_anonymous());
    }
}
