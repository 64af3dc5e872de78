//! Benchmark Engine
//!
//! Drives a sampler `repeat` times per the resolved settings and aggregates
//! the raw sample. With a baseline configured, the baseline is sampled at
//! every position right after the target (same `number`, same `repeat`), and
//! the pointwise ratios are aggregated as well.
//!
//! ```text
//! position:   0        1        2    ...  repeat-1
//! target:     t0       t1       t2        tn
//! baseline:   b0       b1       b2        bn
//! relative:   t0/b0    t1/b1    t2/b2     tn/bn   -> min/mean/max
//! ```

use crate::error::{BaselineError, ConfigError, PerfError};
use crate::kind::{FunctionId, MeasurementKind};
use crate::sampler::{MemorySampler, TimeSampler};
use crate::settings::ResolvedSettings;
use perftest_stats::{Aggregate, Statistic, aggregate, relative_ratios};
use serde::{Deserialize, Serialize};
use std::hint::black_box;

/// A callable that can be measured with an argument tuple.
///
/// Implemented for every `FnMut` of arity 0 to 4 whose arguments are
/// `Clone`; arguments are cloned for each invocation, so pass references
/// for large inputs.
pub trait Measured<Args> {
    /// Call once with `args`, discarding the result through `black_box`
    fn invoke(&mut self, args: &Args);

    /// Identity used for per-function settings and reports
    fn function_id(&self) -> FunctionId {
        FunctionId::of_val(self)
    }
}

macro_rules! impl_measured {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg: Clone),*> Measured<($($arg,)*)> for Func
        where
            Func: FnMut($($arg),*) -> Out,
        {
            #[allow(non_snake_case)]
            #[inline]
            fn invoke(&mut self, args: &($($arg,)*)) {
                let ($($arg,)*) = args;
                black_box(self($(black_box($arg.clone())),*));
            }
        }
    };
}

impl_measured!();
impl_measured!(A);
impl_measured!(A, B);
impl_measured!(A, B, C);
impl_measured!(A, B, C, D);

/// A target with an explicit identity, for closures or renamed functions
pub struct Named<F> {
    id: FunctionId,
    func: F,
}

/// Give `func` an explicit identity
pub fn named<F>(id: impl Into<FunctionId>, func: F) -> Named<F> {
    Named {
        id: id.into(),
        func,
    }
}

impl<F, Args> Measured<Args> for Named<F>
where
    F: Measured<Args>,
{
    #[inline]
    fn invoke(&mut self, args: &Args) {
        self.func.invoke(args);
    }

    fn function_id(&self) -> FunctionId {
        self.id.clone()
    }
}

/// Measured values, one per repeat-group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSample(Vec<f64>);

impl RawSample {
    /// Sample values in measurement order
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of repeat-groups
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the sample is empty (never true for engine output)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for RawSample {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Statistics from one benchmark call. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    kind: MeasurementKind,
    function: FunctionId,
    number: u64,
    raw: Aggregate,
    relative: Option<Aggregate>,
    samples: RawSample,
    baseline: Option<String>,
    baseline_samples: Option<RawSample>,
}

impl AggregatedResult {
    /// What was measured
    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    /// Measured function
    pub fn function(&self) -> &FunctionId {
        &self.function
    }

    /// Invocations per repeat-group (1 for memory)
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Raw min/mean/max
    pub fn raw(&self) -> &Aggregate {
        &self.raw
    }

    /// Baseline-relative min/mean/max, if a baseline was configured
    pub fn relative(&self) -> Option<&Aggregate> {
        self.relative.as_ref()
    }

    /// Smallest raw sample
    pub fn min(&self) -> f64 {
        self.raw.min
    }

    /// Mean raw sample
    pub fn mean(&self) -> f64 {
        self.raw.mean
    }

    /// Largest raw sample
    pub fn max(&self) -> f64 {
        self.raw.max
    }

    /// Smallest ratio to baseline
    pub fn min_relative(&self) -> Option<f64> {
        self.relative.map(|r| r.min)
    }

    /// Mean ratio to baseline
    pub fn mean_relative(&self) -> Option<f64> {
        self.relative.map(|r| r.mean)
    }

    /// Largest ratio to baseline
    pub fn max_relative(&self) -> Option<f64> {
        self.relative.map(|r| r.max)
    }

    /// Raw value of the kind's decision statistic (`min` for time, `max` for memory)
    pub fn primary(&self) -> f64 {
        self.raw.get(self.kind.primary_statistic())
    }

    /// Relative value of the kind's decision statistic
    pub fn primary_relative(&self) -> Option<f64> {
        self.relative
            .map(|r| r.get(self.kind.primary_statistic()))
    }

    /// Look up any raw statistic
    pub fn statistic(&self, statistic: Statistic) -> f64 {
        self.raw.get(statistic)
    }

    /// Raw target sample
    pub fn samples(&self) -> &RawSample {
        &self.samples
    }

    /// Name of the baseline used, if any
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    /// Raw baseline sample, same length as [`Self::samples`]
    pub fn baseline_samples(&self) -> Option<&RawSample> {
        self.baseline_samples.as_ref()
    }
}

/// Measure execution time of `target(args)`
pub fn time_benchmark<F, Args>(
    target: &mut F,
    args: &Args,
    settings: &ResolvedSettings,
    sampler: &mut dyn TimeSampler,
) -> Result<AggregatedResult, PerfError>
where
    F: Measured<Args>,
{
    expect_kind(settings, MeasurementKind::Time)?;
    let function = target.function_id();
    let number = settings.number;
    let mut call = || target.invoke(args);

    run_samples(function, settings, &mut call, |f| sampler.sample_group(f, number))
}

/// Measure peak memory of `target(args)`
pub fn memory_usage_benchmark<F, Args>(
    target: &mut F,
    args: &Args,
    settings: &ResolvedSettings,
    sampler: &mut dyn MemorySampler,
) -> Result<AggregatedResult, PerfError>
where
    F: Measured<Args>,
{
    expect_kind(settings, MeasurementKind::Memory)?;
    sampler.ensure_ready()?;
    let function = target.function_id();
    let mut call = || target.invoke(args);

    run_samples(function, settings, &mut call, |f| sampler.sample_peak(f))
}

fn expect_kind(settings: &ResolvedSettings, kind: MeasurementKind) -> Result<(), ConfigError> {
    if settings.kind != kind {
        return Err(ConfigError::new(format!(
            "{} benchmark given settings resolved for {}",
            kind, settings.kind
        )));
    }
    if settings.repeat == 0 {
        return Err(ConfigError::new("`repeat` must be at least 1"));
    }
    Ok(())
}

fn run_samples(
    function: FunctionId,
    settings: &ResolvedSettings,
    target: &mut dyn FnMut(),
    mut sample: impl FnMut(&mut dyn FnMut()) -> f64,
) -> Result<AggregatedResult, PerfError> {
    let repeat = settings.repeat as usize;
    let mut samples = Vec::with_capacity(repeat);
    let mut baseline_samples = settings.baseline.map(|_| Vec::with_capacity(repeat));

    for _ in 0..repeat {
        samples.push(sample(&mut *target));
        if let (Some(baseline), Some(out)) = (settings.baseline, baseline_samples.as_mut()) {
            let mut run_baseline = || baseline.run();
            out.push(sample(&mut run_baseline));
        }
    }

    let raw = aggregate(&samples).map_err(|e| ConfigError::new(e.to_string()))?;

    let relative = match (&settings.baseline, &baseline_samples) {
        (Some(baseline), Some(reference)) => {
            let baseline_error = |source| BaselineError {
                function: function.clone(),
                baseline: baseline.name().to_string(),
                source,
            };
            let ratios = relative_ratios(&samples, reference).map_err(baseline_error)?;
            Some(aggregate(&ratios).map_err(baseline_error)?)
        }
        _ => None,
    };

    tracing::debug!(
        function = %function,
        kind = %settings.kind,
        repeat,
        number = settings.number,
        min = raw.min,
        max = raw.max,
        "benchmark sampled"
    );

    Ok(AggregatedResult {
        kind: settings.kind,
        function,
        number: settings.number,
        raw,
        relative,
        samples: RawSample(samples),
        baseline: settings.baseline.map(|b| b.name().to_string()),
        baseline_samples: baseline_samples.map(RawSample),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::settings::{Baseline, CallOverrides, Params, SettingsStore};

    /// Replays queued values, one per call; `default` once exhausted
    pub(crate) struct ScriptedSampler {
        pub values: Vec<f64>,
        pub default: f64,
        pub calls: usize,
        pub invocations: u64,
    }

    impl ScriptedSampler {
        pub(crate) fn constant(value: f64) -> Self {
            Self::script(Vec::new(), value)
        }

        pub(crate) fn script(values: Vec<f64>, default: f64) -> Self {
            Self {
                values,
                default,
                calls: 0,
                invocations: 0,
            }
        }

        fn next(&mut self) -> f64 {
            let value = self.values.get(self.calls).copied().unwrap_or(self.default);
            self.calls += 1;
            value
        }
    }

    impl TimeSampler for ScriptedSampler {
        fn sample_group(&mut self, f: &mut dyn FnMut(), number: u64) -> f64 {
            for _ in 0..number {
                f();
                self.invocations += 1;
            }
            self.next()
        }
    }

    impl MemorySampler for ScriptedSampler {
        fn sample_peak(&mut self, f: &mut dyn FnMut()) -> f64 {
            f();
            self.invocations += 1;
            self.next()
        }
    }

    fn sum_values(n: u64) -> u64 {
        (0..n).sum()
    }

    fn resolved(kind: MeasurementKind, params: Params) -> ResolvedSettings {
        let mut store = SettingsStore::new();
        store.set_defaults(kind, params).unwrap();
        store
            .resolve(&FunctionId::new("t"), kind, &CallOverrides::none())
            .unwrap()
    }

    #[test]
    fn test_sample_length_equals_repeat() {
        for repeat in 1..=6 {
            let settings = resolved(MeasurementKind::Time, Params::new().number(3).repeat(repeat));
            let mut sampler = ScriptedSampler::constant(0.1);
            let result =
                time_benchmark(&mut sum_values, &(10u64,), &settings, &mut sampler).unwrap();
            assert_eq!(result.samples().len(), repeat as usize);
            assert_eq!(sampler.invocations, 3 * repeat);
        }
    }

    #[test]
    fn test_aggregates_time() {
        let settings = resolved(MeasurementKind::Time, Params::new().number(1));
        let mut sampler = ScriptedSampler::script(vec![0.3, 0.1, 0.2, 0.5, 0.4], 0.0);
        let result = time_benchmark(&mut sum_values, &(10u64,), &settings, &mut sampler).unwrap();

        assert_eq!(result.min(), 0.1);
        assert_eq!(result.max(), 0.5);
        assert!((result.mean() - 0.3).abs() < 1e-12);
        assert_eq!(result.primary(), 0.1);
        assert!(result.relative().is_none());
        assert!(result.baseline_samples().is_none());
        assert!(result.function().as_str().ends_with("sum_values"));
    }

    #[test]
    fn test_memory_ignores_number() {
        let settings = resolved(MeasurementKind::Memory, Params::new().repeat(3));
        let mut sampler = ScriptedSampler::script(vec![10.0, 12.0, 11.0], 0.0);
        let result =
            memory_usage_benchmark(&mut sum_values, &(10u64,), &settings, &mut sampler).unwrap();

        assert_eq!(sampler.invocations, 3);
        assert_eq!(result.primary(), 12.0);
        assert_eq!(result.number(), 1);
    }

    #[test]
    fn test_relative_interleaves_baseline() {
        let settings = resolved(
            MeasurementKind::Time,
            Params::new().number(1).baseline(Baseline::standard()),
        );
        // target, baseline, target, baseline, ...
        let mut sampler =
            ScriptedSampler::script(vec![2.0, 1.0, 4.0, 1.0, 3.0, 2.0, 2.0, 1.0, 2.0, 1.0], 0.0);
        let result = time_benchmark(&mut sum_values, &(10u64,), &settings, &mut sampler).unwrap();

        assert_eq!(result.samples().values(), &[2.0, 4.0, 3.0, 2.0, 2.0]);
        assert_eq!(
            result.baseline_samples().unwrap().values(),
            &[1.0, 1.0, 2.0, 1.0, 1.0]
        );
        assert_eq!(result.min_relative(), Some(1.5));
        assert_eq!(result.max_relative(), Some(4.0));
        assert_eq!(result.baseline(), Some("standard"));
    }

    #[test]
    fn test_zero_baseline_sample_is_baseline_error() {
        let settings = resolved(
            MeasurementKind::Memory,
            Params::new().repeat(2).baseline(Baseline::standard()),
        );
        let mut sampler = ScriptedSampler::script(vec![5.0, 1.0, 5.0, 0.0], 0.0);
        let err = memory_usage_benchmark(&mut sum_values, &(10u64,), &settings, &mut sampler)
            .unwrap_err();

        match err {
            PerfError::Baseline(e) => {
                assert_eq!(e.baseline, "standard");
                assert!(e.function.as_str().ends_with("sum_values"));
            }
            other => panic!("expected baseline error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_kind_settings_rejected() {
        let settings = resolved(MeasurementKind::Memory, Params::new());
        let mut sampler = ScriptedSampler::constant(1.0);
        let err =
            time_benchmark(&mut sum_values, &(10u64,), &settings, &mut sampler).unwrap_err();
        assert_eq!(err.kind_name(), "ConfigError");
        assert_eq!(sampler.calls, 0);
    }

    #[derive(Debug)]
    struct CountedInput<'a>(&'a std::cell::Cell<u32>);

    impl Clone for CountedInput<'_> {
        fn clone(&self) -> Self {
            self.0.set(self.0.get() + 1);
            Self(self.0)
        }
    }

    #[test]
    fn test_each_invocation_gets_fresh_arguments() {
        let settings = resolved(MeasurementKind::Time, Params::new().number(4).repeat(2));
        let mut sampler = ScriptedSampler::constant(0.1);
        let clones = std::cell::Cell::new(0);
        let mut target = |input: CountedInput<'_>, n: u64| input.0.get() as u64 + n;

        time_benchmark(&mut target, &(CountedInput(&clones), 7u64), &settings, &mut sampler)
            .unwrap();
        assert_eq!(clones.get(), 8);
        assert_eq!(sampler.invocations, 8);
    }

    #[test]
    fn test_named_target_and_arities() {
        let settings = resolved(MeasurementKind::Time, Params::new().number(2).repeat(1));
        let mut sampler = ScriptedSampler::constant(0.5);

        let mut target = named("demo::closure", |a: u64, b: &str| a as usize + b.len());
        let result = time_benchmark(&mut target, &(1u64, "xy"), &settings, &mut sampler).unwrap();
        assert_eq!(result.function().as_str(), "demo::closure");

        let mut no_args = || 42u8;
        let result = time_benchmark(&mut no_args, &(), &settings, &mut sampler).unwrap();
        assert_eq!(result.samples().len(), 1);
    }
}
