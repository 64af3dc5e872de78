//! Settings Store
//!
//! Measurement parameters resolve through four layers, lowest priority
//! first:
//!
//! ```text
//! built-in defaults  <  global (set_defaults)  <  per-function (set)  <  CallOverrides
//! ```
//!
//! `CallOverrides` are one-shot: they shape a single benchmark call and are
//! never written back into the store. They travel next to the target's own
//! arguments, never inside them, so a measured function may freely take an
//! argument called `number`.

use crate::error::ConfigError;
use crate::kind::{FunctionId, MeasurementKind};
use fxhash::FxHashMap;
use std::fmt;
use std::hint::black_box;
use std::path::PathBuf;

/// Default invocations per repeat-group for time measurements
pub const DEFAULT_NUMBER: u64 = 100_000;

/// Default repeat-groups for time measurements
pub const DEFAULT_TIME_REPEAT: u64 = 5;

/// Default repeats for memory measurements
pub const DEFAULT_MEMORY_REPEAT: u64 = 1;

/// Default significant digits when printing results
pub const DEFAULT_DIGITS_FOR_PRINTING: usize = 4;

/// Default result log file
pub const DEFAULT_LOG_FILE: &str = "perftest.log";

/// Names accepted by [`Params::set_named`]
pub const PARAM_NAMES: [&str; 6] = [
    "number",
    "repeat",
    "digits_for_printing",
    "log_to_file",
    "log_file",
    "baseline",
];

/// Elements summed by the standard baseline (1 MiB of `u64`)
const STANDARD_BASELINE_LEN: u64 = 131_072;

/// Reference workload measured alongside a target to get portable ratios
#[derive(Clone, Copy)]
pub struct Baseline {
    name: &'static str,
    func: fn(),
}

impl Baseline {
    /// Baseline from a named function
    pub const fn new(name: &'static str, func: fn()) -> Self {
        Self { name, func }
    }

    /// Built-in workload: allocate, fill and sum 1 MiB of integers.
    ///
    /// Exercises both the CPU and the allocator, so it serves time and
    /// memory checks alike.
    pub fn standard() -> Self {
        Self::new("standard", standard_workload)
    }

    /// Baseline name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the baseline once
    #[inline]
    pub fn run(&self) {
        (self.func)()
    }
}

fn standard_workload() {
    let values: Vec<u64> = (0..STANDARD_BASELINE_LEN).collect();
    black_box(values.iter().sum::<u64>());
}

impl fmt::Debug for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Baseline").field(&self.name).finish()
    }
}

impl PartialEq for Baseline {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Loosely typed value, as read from a config file
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Integer value
    Integer(i64),
    /// Boolean value
    Bool(bool),
    /// String value
    Text(String),
}

impl SettingValue {
    fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Integer(_) => "integer",
            SettingValue::Bool(_) => "boolean",
            SettingValue::Text(_) => "string",
        }
    }
}

/// One tier of parameter overrides. `None` falls through to the tier below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    /// Invocations per repeat-group (time only)
    pub number: Option<u64>,
    /// Repeat-groups per benchmark call
    pub repeat: Option<u64>,
    /// Significant digits when printing results
    pub digits_for_printing: Option<usize>,
    /// Append every evaluation to `log_file`
    pub log_to_file: Option<bool>,
    /// Result log path
    pub log_file: Option<PathBuf>,
    /// Reference workload for relative limits
    pub baseline: Option<Baseline>,
}

impl Params {
    /// Empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `number`
    pub fn number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self
    }

    /// Set `repeat`
    pub fn repeat(mut self, repeat: u64) -> Self {
        self.repeat = Some(repeat);
        self
    }

    /// Set `digits_for_printing`
    pub fn digits_for_printing(mut self, digits: usize) -> Self {
        self.digits_for_printing = Some(digits);
        self
    }

    /// Set `log_to_file`
    pub fn log_to_file(mut self, enabled: bool) -> Self {
        self.log_to_file = Some(enabled);
        self
    }

    /// Set `log_file`
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set `baseline`
    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Whether no parameter is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set a parameter by name, rejecting unknown names and mistyped values
    pub fn set_named(&mut self, name: &str, value: SettingValue) -> Result<(), ConfigError> {
        let mismatch = |expected: &str, value: &SettingValue| {
            ConfigError::new(format!(
                "setting `{}` expects {}, got {}",
                name,
                expected,
                value.type_name()
            ))
        };

        match name {
            "number" | "repeat" | "digits_for_printing" => {
                let SettingValue::Integer(n) = value else {
                    return Err(mismatch("an integer", &value));
                };
                let n = u64::try_from(n).map_err(|_| {
                    ConfigError::new(format!("setting `{}` must not be negative", name))
                })?;
                match name {
                    "number" => self.number = Some(n),
                    "repeat" => self.repeat = Some(n),
                    _ => self.digits_for_printing = Some(n as usize),
                }
            }
            "log_to_file" => match value {
                SettingValue::Bool(b) => self.log_to_file = Some(b),
                other => return Err(mismatch("a boolean", &other)),
            },
            "log_file" => match value {
                SettingValue::Text(path) => self.log_file = Some(PathBuf::from(path)),
                other => return Err(mismatch("a path string", &other)),
            },
            "baseline" => match value {
                SettingValue::Text(s) if s == "standard" => self.baseline = Some(Baseline::standard()),
                SettingValue::Text(s) => {
                    return Err(ConfigError::new(format!(
                        "unknown baseline `{}` (available: standard)",
                        s
                    )));
                }
                other => return Err(mismatch("a baseline name", &other)),
            },
            _ => {
                return Err(ConfigError::new(format!(
                    "unknown setting `{}` (expected one of: {})",
                    name,
                    PARAM_NAMES.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Merge, with `upper` taking priority
    pub fn overlay(&self, upper: &Params) -> Params {
        Params {
            number: upper.number.or(self.number),
            repeat: upper.repeat.or(self.repeat),
            digits_for_printing: upper.digits_for_printing.or(self.digits_for_printing),
            log_to_file: upper.log_to_file.or(self.log_to_file),
            log_file: upper.log_file.clone().or_else(|| self.log_file.clone()),
            baseline: upper.baseline.or(self.baseline),
        }
    }

    fn validate(&self, kind: MeasurementKind) -> Result<(), ConfigError> {
        if self.number.is_some() && kind == MeasurementKind::Memory {
            return Err(ConfigError::new("`number` applies only to time measurements"));
        }
        if self.number == Some(0) {
            return Err(ConfigError::new("`number` must be at least 1"));
        }
        if self.repeat == Some(0) {
            return Err(ConfigError::new("`repeat` must be at least 1"));
        }
        if self.digits_for_printing == Some(0) {
            return Err(ConfigError::new("`digits_for_printing` must be at least 1"));
        }
        if self
            .log_file
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::new("`log_file` must not be empty"));
        }
        Ok(())
    }
}

/// Built-in defaults for a kind
pub fn builtin_defaults(kind: MeasurementKind) -> Params {
    let (number, repeat) = match kind {
        MeasurementKind::Time => (DEFAULT_NUMBER, DEFAULT_TIME_REPEAT),
        MeasurementKind::Memory => (1, DEFAULT_MEMORY_REPEAT),
    };
    Params {
        number: Some(number),
        repeat: Some(repeat),
        digits_for_printing: Some(DEFAULT_DIGITS_FOR_PRINTING),
        log_to_file: Some(false),
        log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        baseline: None,
    }
}

/// One-shot overrides for a single benchmark call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOverrides {
    /// Invocations per repeat-group (time only)
    pub number: Option<u64>,
    /// Repeat-groups
    pub repeat: Option<u64>,
}

impl CallOverrides {
    /// No overrides
    pub fn none() -> Self {
        Self::default()
    }

    /// Override `number` for this call
    pub fn number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self
    }

    /// Override `repeat` for this call
    pub fn repeat(mut self, repeat: u64) -> Self {
        self.repeat = Some(repeat);
        self
    }

    fn as_params(&self) -> Params {
        Params {
            number: self.number,
            repeat: self.repeat,
            ..Params::default()
        }
    }
}

/// Fully resolved parameters for one benchmark call
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    /// Kind these settings were resolved for
    pub kind: MeasurementKind,
    /// Invocations per repeat-group (always 1 for memory)
    pub number: u64,
    /// Repeat-groups
    pub repeat: u64,
    /// Significant digits when printing results
    pub digits_for_printing: usize,
    /// Append evaluations to `log_file`
    pub log_to_file: bool,
    /// Result log path
    pub log_file: PathBuf,
    /// Reference workload, if relative measurement is enabled
    pub baseline: Option<Baseline>,
}

/// Typed parameter storage scoped by kind and, optionally, function
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    global: FxHashMap<MeasurementKind, Params>,
    per_function: FxHashMap<(FunctionId, MeasurementKind), Params>,
}

impl SettingsStore {
    /// Empty store (built-in defaults only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist overrides for one function and kind.
    ///
    /// Merges into earlier `set` calls for the same pair; a parameter keeps
    /// its value until overwritten.
    pub fn set(
        &mut self,
        function: &FunctionId,
        kind: MeasurementKind,
        params: Params,
    ) -> Result<(), ConfigError> {
        if function.is_anonymous() {
            return Err(ConfigError::new(format!(
                "`{}` has no unique identity; wrap the target in `named(..)` to give it settings",
                function
            )));
        }
        params.validate(kind)?;
        let entry = self
            .per_function
            .entry((function.clone(), kind))
            .or_default();
        *entry = entry.overlay(&params);
        tracing::debug!(function = %function, %kind, "per-function settings updated");
        Ok(())
    }

    /// Persist overrides for every function lacking a more specific one
    pub fn set_defaults(&mut self, kind: MeasurementKind, params: Params) -> Result<(), ConfigError> {
        params.validate(kind)?;
        let entry = self.global.entry(kind).or_default();
        *entry = entry.overlay(&params);
        tracing::debug!(%kind, "global settings updated");
        Ok(())
    }

    /// Effective parameters for one call. Never mutates the store.
    pub fn resolve(
        &self,
        function: &FunctionId,
        kind: MeasurementKind,
        overrides: &CallOverrides,
    ) -> Result<ResolvedSettings, ConfigError> {
        let ad_hoc = overrides.as_params();
        ad_hoc.validate(kind)?;

        let mut merged = builtin_defaults(kind);
        if let Some(global) = self.global.get(&kind) {
            merged = merged.overlay(global);
        }
        if let Some(specific) = self.per_function.get(&(function.clone(), kind)) {
            merged = merged.overlay(specific);
        }
        merged = merged.overlay(&ad_hoc);

        Ok(ResolvedSettings {
            kind,
            number: match kind {
                MeasurementKind::Time => merged.number.unwrap_or(DEFAULT_NUMBER),
                MeasurementKind::Memory => 1,
            },
            repeat: merged.repeat.unwrap_or(DEFAULT_TIME_REPEAT),
            digits_for_printing: merged
                .digits_for_printing
                .unwrap_or(DEFAULT_DIGITS_FOR_PRINTING),
            log_to_file: merged.log_to_file.unwrap_or(false),
            log_file: merged
                .log_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            baseline: merged.baseline,
        })
    }

    /// Global overrides stored for a kind
    pub fn global_params(&self, kind: MeasurementKind) -> Option<&Params> {
        self.global.get(&kind)
    }

    /// Per-function overrides stored for a function and kind
    pub fn function_params(&self, function: &FunctionId, kind: MeasurementKind) -> Option<&Params> {
        self.per_function.get(&(function.clone(), kind))
    }
}
