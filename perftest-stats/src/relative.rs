//! Baseline-relative ratios
//!
//! Each target sample is divided by the baseline sample taken at the same
//! position. The ratios are dimensionless, which is what makes a relative
//! limit portable across machines.

use crate::StatsError;

/// Divide `target[i]` by `baseline[i]` for every position.
///
/// Fails closed: a zero (or non-finite) baseline sample is an error rather
/// than an infinite ratio.
pub fn relative_ratios(target: &[f64], baseline: &[f64]) -> Result<Vec<f64>, StatsError> {
    if target.len() != baseline.len() {
        return Err(StatsError::LengthMismatch {
            target: target.len(),
            baseline: baseline.len(),
        });
    }
    if target.is_empty() {
        return Err(StatsError::EmptySamples);
    }

    target
        .iter()
        .zip(baseline)
        .enumerate()
        .map(|(index, (&t, &b))| {
            if b == 0.0 || !b.is_finite() {
                Err(StatsError::ZeroBaseline { index, value: b })
            } else {
                Ok(t / b)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;

    #[test]
    fn test_pointwise_division() {
        let ratios = relative_ratios(&[2.0, 4.0, 9.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ratios, vec![2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zero_baseline_fails_closed() {
        let err = relative_ratios(&[1.0, 1.0], &[1.0, 0.0]).unwrap_err();
        assert_eq!(err, StatsError::ZeroBaseline { index: 1, value: 0.0 });
    }

    #[test]
    fn test_length_mismatch() {
        let err = relative_ratios(&[1.0, 1.0], &[1.0]).unwrap_err();
        assert!(matches!(err, StatsError::LengthMismatch { target: 2, baseline: 1 }));
    }

    #[test]
    fn test_scale_invariance() {
        let target = [0.3, 0.5, 0.4, 0.35];
        let baseline = [0.1, 0.2, 0.15, 0.12];
        let k = 7.5;

        let scaled_target: Vec<f64> = target.iter().map(|v| v * k).collect();
        let scaled_baseline: Vec<f64> = baseline.iter().map(|v| v * k).collect();

        let a = aggregate(&relative_ratios(&target, &baseline).unwrap()).unwrap();
        let b = aggregate(&relative_ratios(&scaled_target, &scaled_baseline).unwrap()).unwrap();

        assert!((a.min - b.min).abs() < 1e-12);
        assert!((a.mean - b.mean).abs() < 1e-12);
        assert!((a.max - b.max).abs() < 1e-12);
    }
}
