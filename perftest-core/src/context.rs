//! Check execution context
//!
//! A [`Harness`] owns one settings store and the samplers. A
//! [`CheckContext`] borrows the harness for the duration of one check
//! function and records every evaluation that check performs.
//!
//! Every test follows the same order: validate the limit, resolve settings,
//! refuse relative limits without a baseline, and only then sample. An
//! unevaluable check never pays for measurement.

use crate::benchmark::{AggregatedResult, Measured, memory_usage_benchmark, time_benchmark};
use crate::error::{ConfigError, PerfError};
use crate::format::pp;
use crate::kind::{FunctionId, MeasurementKind};
use crate::limit::{Evaluation, Limit, evaluate};
use crate::log::append_result_line;
use crate::sampler::{HeapPeakSampler, MemorySampler, TimeSampler, WallClockSampler};
use crate::settings::{CallOverrides, Params, ResolvedSettings, SettingsStore};

/// Owns the settings store and samplers used by checks
pub struct Harness {
    settings: SettingsStore,
    time_sampler: Box<dyn TimeSampler>,
    memory_sampler: Box<dyn MemorySampler>,
}

impl Harness {
    /// Harness with the default wall-clock and heap-peak samplers
    pub fn new(settings: SettingsStore) -> Self {
        Self::with_samplers(settings, WallClockSampler, HeapPeakSampler::new())
    }

    /// Harness with custom samplers
    pub fn with_samplers(
        settings: SettingsStore,
        time_sampler: impl TimeSampler + 'static,
        memory_sampler: impl MemorySampler + 'static,
    ) -> Self {
        Self {
            settings,
            time_sampler: Box::new(time_sampler),
            memory_sampler: Box::new(memory_sampler),
        }
    }

    /// Settings store
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Mutable settings store
    pub fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    /// Context for running one check function
    pub fn context(&mut self, checker: impl Into<String>) -> CheckContext<'_> {
        CheckContext {
            harness: self,
            checker: checker.into(),
            evaluations: Vec::new(),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(SettingsStore::new())
    }
}

/// What a check function receives
pub struct CheckContext<'h> {
    harness: &'h mut Harness,
    checker: String,
    evaluations: Vec<Evaluation>,
}

impl CheckContext<'_> {
    /// Qualified name of the running check
    pub fn checker(&self) -> &str {
        &self.checker
    }

    /// Settings store shared by every check in the session
    pub fn settings(&mut self) -> &mut SettingsStore {
        &mut self.harness.settings
    }

    /// Persist per-function overrides for `function`.
    ///
    /// Keyed the same way the benchmarks resolve, so a [`crate::Named`]
    /// target is stored under its explicit name. Closures and fn pointers
    /// are rejected.
    pub fn set<F, Args>(
        &mut self,
        function: &F,
        kind: MeasurementKind,
        params: Params,
    ) -> Result<(), ConfigError>
    where
        F: Measured<Args>,
    {
        self.harness
            .settings
            .set(&function.function_id(), kind, params)
    }

    /// Persist global overrides for `kind`
    pub fn set_defaults(&mut self, kind: MeasurementKind, params: Params) -> Result<(), ConfigError> {
        self.harness.settings.set_defaults(kind, params)
    }

    /// Measure execution time without a limit
    pub fn time_benchmark<F, Args>(
        &mut self,
        target: F,
        args: Args,
    ) -> Result<AggregatedResult, PerfError>
    where
        F: Measured<Args>,
    {
        self.time_benchmark_with(target, args, CallOverrides::none())
    }

    /// Measure execution time with one-shot overrides
    pub fn time_benchmark_with<F, Args>(
        &mut self,
        mut target: F,
        args: Args,
        overrides: CallOverrides,
    ) -> Result<AggregatedResult, PerfError>
    where
        F: Measured<Args>,
    {
        let settings = self.resolve(&target.function_id(), MeasurementKind::Time, &overrides)?;
        time_benchmark(
            &mut target,
            &args,
            &settings,
            self.harness.time_sampler.as_mut(),
        )
    }

    /// Measure peak memory without a limit
    pub fn memory_usage_benchmark<F, Args>(
        &mut self,
        target: F,
        args: Args,
    ) -> Result<AggregatedResult, PerfError>
    where
        F: Measured<Args>,
    {
        self.memory_usage_benchmark_with(target, args, CallOverrides::none())
    }

    /// Measure peak memory with one-shot overrides
    pub fn memory_usage_benchmark_with<F, Args>(
        &mut self,
        mut target: F,
        args: Args,
        overrides: CallOverrides,
    ) -> Result<AggregatedResult, PerfError>
    where
        F: Measured<Args>,
    {
        let settings = self.resolve(&target.function_id(), MeasurementKind::Memory, &overrides)?;
        memory_usage_benchmark(
            &mut target,
            &args,
            &settings,
            self.harness.memory_sampler.as_mut(),
        )
    }

    /// Assert that `target(args)` runs within `limit`
    pub fn time_test<F, Args>(
        &mut self,
        target: F,
        args: Args,
        limit: Limit,
    ) -> Result<Evaluation, PerfError>
    where
        F: Measured<Args>,
    {
        self.time_test_with(target, args, limit, CallOverrides::none())
    }

    /// [`Self::time_test`] with one-shot overrides
    pub fn time_test_with<F, Args>(
        &mut self,
        mut target: F,
        args: Args,
        limit: Limit,
        overrides: CallOverrides,
    ) -> Result<Evaluation, PerfError>
    where
        F: Measured<Args>,
    {
        let settings = self.prepare(&target.function_id(), MeasurementKind::Time, &limit, &overrides)?;
        let result = time_benchmark(
            &mut target,
            &args,
            &settings,
            self.harness.time_sampler.as_mut(),
        )?;
        self.finish(&result, &limit, &settings)
    }

    /// Assert that `target(args)` peaks within `limit`
    pub fn memory_usage_test<F, Args>(
        &mut self,
        target: F,
        args: Args,
        limit: Limit,
    ) -> Result<Evaluation, PerfError>
    where
        F: Measured<Args>,
    {
        self.memory_usage_test_with(target, args, limit, CallOverrides::none())
    }

    /// [`Self::memory_usage_test`] with one-shot overrides
    pub fn memory_usage_test_with<F, Args>(
        &mut self,
        mut target: F,
        args: Args,
        limit: Limit,
        overrides: CallOverrides,
    ) -> Result<Evaluation, PerfError>
    where
        F: Measured<Args>,
    {
        let settings = self.prepare(&target.function_id(), MeasurementKind::Memory, &limit, &overrides)?;
        let result = memory_usage_benchmark(
            &mut target,
            &args,
            &settings,
            self.harness.memory_sampler.as_mut(),
        )?;
        self.finish(&result, &limit, &settings)
    }

    /// Evaluations that passed so far, in order
    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    /// Consume the context, keeping its evaluations
    pub fn into_evaluations(self) -> Vec<Evaluation> {
        self.evaluations
    }

    fn resolve(
        &self,
        function: &FunctionId,
        kind: MeasurementKind,
        overrides: &CallOverrides,
    ) -> Result<ResolvedSettings, ConfigError> {
        self.harness.settings.resolve(function, kind, overrides)
    }

    fn prepare(
        &self,
        function: &FunctionId,
        kind: MeasurementKind,
        limit: &Limit,
        overrides: &CallOverrides,
    ) -> Result<ResolvedSettings, ConfigError> {
        limit.validate()?;
        let settings = self.resolve(function, kind, overrides)?;
        if limit.relative.is_some() && settings.baseline.is_none() {
            return Err(ConfigError::new(format!(
                "`relative_limit` given for `{}` but no {} baseline is configured",
                function, kind
            )));
        }
        Ok(settings)
    }

    fn finish(
        &mut self,
        result: &AggregatedResult,
        limit: &Limit,
        settings: &ResolvedSettings,
    ) -> Result<Evaluation, PerfError> {
        let outcome = evaluate(result, limit, &self.checker, settings.digits_for_printing);

        if settings.log_to_file {
            let line = log_line(result, &self.checker, &outcome, settings.digits_for_printing);
            if let Err(e) = append_result_line(&settings.log_file, &line) {
                tracing::warn!(
                    path = %settings.log_file.display(),
                    checker = %self.checker,
                    "failed to log result: {}",
                    e
                );
            }
        }

        let evaluation = outcome?;
        self.evaluations.push(evaluation.clone());
        Ok(evaluation)
    }
}

fn log_line(
    result: &AggregatedResult,
    checker: &str,
    outcome: &Result<Evaluation, PerfError>,
    digits: usize,
) -> String {
    let statistic = result.kind().primary_statistic();
    let mut line = format!(
        "{} {} checker={} {}={}",
        result.kind(),
        result.function(),
        checker,
        statistic,
        pp(result.primary(), digits)
    );
    if let Some(relative) = result.primary_relative() {
        line.push_str(&format!(
            " {}={}",
            statistic.relative_name(),
            pp(relative, digits)
        ));
    }
    line.push_str(match outcome {
        Ok(_) => " passed",
        Err(_) => " FAILED",
    });
    line
}
