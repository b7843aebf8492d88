//! Empirical disturbance-interval distribution.
//!
//! Each annual burn fraction `f` implies an expected recurrence interval
//! `n = 1/f` years. We treat "years since last fire" for that observation as
//! uniform on `[0, n)` and evaluate the density `1/n` at the integer years
//! `0, 1, …, ceil(n) - 1`. Summing these step densities over all observations
//! (aligned at year 0, shorter ones zero-extended) and renormalizing gives a
//! PMF in which short intervals are supported by every observation and long
//! intervals only by the rare low-burn years.
//!
//! The support length is set by the smallest fraction, so a single near-zero
//! observation can demand an enormous array. The required length is computed
//! before allocating and checked against a cap; exceeding it (or failing to
//! allocate) is reported as `EstimateError::ResourceExhausted`.

use tracing::{debug, info};

use crate::error::{EstimateError, Stage};
use crate::math::linspace;

/// Normalized empirical PMF over years since the last fire.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalPmf {
    /// Probability mass per one-year step; sums to 1.
    pub pmf: Vec<f64>,
    /// x-coordinates (years) matching `pmf`.
    pub support: Vec<f64>,
    /// Smallest burn fraction seen (it sets the support length).
    pub min_fraction: f64,
}

impl EmpiricalPmf {
    pub fn len(&self) -> usize {
        self.pmf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pmf.is_empty()
    }

    /// Mean years since last fire under the PMF.
    pub fn mean(&self) -> f64 {
        self.support
            .iter()
            .zip(&self.pmf)
            .map(|(x, p)| x * p)
            .sum()
    }
}

/// Expected years between fires for a constant annual burn fraction.
pub fn recurrence_interval(burn_fraction: f64) -> f64 {
    1.0 / burn_fraction
}

/// Number of integer years `k >= 0` with `k < 1/f`.
///
/// Saturates at `usize::MAX` for fractions so small that `1/f` overflows.
pub fn support_len(burn_fraction: f64) -> usize {
    let n = recurrence_interval(burn_fraction);
    if !n.is_finite() {
        return usize::MAX;
    }
    n.ceil() as usize
}

/// Running `(x_min, x_max, steps)` of the per-observation ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridBounds {
    x_min: f64,
    x_max: f64,
    steps: usize,
}

impl GridBounds {
    fn of_range(len: usize) -> Self {
        Self {
            x_min: 0.0,
            x_max: len.saturating_sub(1) as f64,
            steps: len,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            x_max: self.x_max.max(other.x_max),
            steps: self.steps.max(other.steps),
        }
    }
}

/// State carried through the fold over observations.
struct Accumulator {
    sum: Vec<f64>,
    bounds: Option<GridBounds>,
    min_fraction: f64,
}

impl Accumulator {
    fn push(mut self, burn_fraction: f64) -> Self {
        let n = recurrence_interval(burn_fraction);
        let len = support_len(burn_fraction);

        add_uniform_density(&mut self.sum, len, 1.0 / n);

        let range = GridBounds::of_range(len);
        self.bounds = Some(match self.bounds {
            Some(bounds) => bounds.merge(range),
            None => range,
        });
        self.min_fraction = self.min_fraction.min(burn_fraction);
        self
    }
}

/// Add `density` to the first `len` entries, zero-extending `sum` if shorter.
fn add_uniform_density(sum: &mut Vec<f64>, len: usize, density: f64) {
    if sum.len() < len {
        sum.resize(len, 0.0);
    }
    for v in &mut sum[..len] {
        *v += density;
    }
}

/// Reject fractions outside `(0, 1]`.
pub fn validate_fractions(burn_fractions: &[f64]) -> Result<(), EstimateError> {
    if burn_fractions.is_empty() {
        return Err(EstimateError::EmptyObservations);
    }
    for (index, &value) in burn_fractions.iter().enumerate() {
        if !(value.is_finite() && value > 0.0 && value <= 1.0) {
            return Err(EstimateError::InvalidObservation { index, value });
        }
    }
    Ok(())
}

/// Build the normalized empirical PMF for one spatial unit.
///
/// `max_support_len` caps the working array (in one-year steps).
pub fn build_empirical_pmf(
    burn_fractions: &[f64],
    max_support_len: usize,
) -> Result<EmpiricalPmf, EstimateError> {
    validate_fractions(burn_fractions)?;

    let required = burn_fractions
        .iter()
        .map(|&f| support_len(f))
        .max()
        .unwrap_or(0);
    let exhausted = EstimateError::ResourceExhausted {
        stage: Stage::EmpiricalPmf,
        required,
        limit: max_support_len,
    };
    if required > max_support_len {
        return Err(exhausted);
    }

    let mut sum = Vec::new();
    sum.try_reserve_exact(required).map_err(|_| exhausted.clone())?;

    let acc = burn_fractions.iter().fold(
        Accumulator {
            sum,
            bounds: None,
            min_fraction: f64::INFINITY,
        },
        |acc, &f| acc.push(f),
    );

    info!(
        min_fraction = acc.min_fraction,
        "minimum annual fraction of area disturbed"
    );

    let Some(bounds) = acc.bounds else {
        return Err(EstimateError::EmptyObservations);
    };

    let mut pmf = acc.sum;
    let total: f64 = pmf.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(EstimateError::NonFinite);
    }
    for v in &mut pmf {
        *v /= total;
    }

    let support = linspace(bounds.x_min, bounds.x_max, bounds.steps);
    debug!(len = pmf.len(), x_max = bounds.x_max, "built empirical pmf");

    Ok(EmpiricalPmf {
        pmf,
        support,
        min_fraction: acc.min_fraction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 10_000_000;

    fn total(pmf: &EmpiricalPmf) -> f64 {
        pmf.pmf.iter().sum()
    }

    #[test]
    fn single_observation_is_uniform() {
        let out = build_empirical_pmf(&[0.3], CAP).unwrap();
        // 1/0.3 = 3.33.. -> years 0..=3
        assert_eq!(out.len(), 4);
        assert_eq!(out.support, vec![0.0, 1.0, 2.0, 3.0]);
        assert!((total(&out) - 1.0).abs() < 1e-12);
        for p in &out.pmf {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn integer_interval_excludes_endpoint() {
        let out = build_empirical_pmf(&[0.1], CAP).unwrap();
        assert_eq!(out.len(), 10);
        assert_eq!(out.support.last().copied(), Some(9.0));
    }

    #[test]
    fn mismatched_lengths_are_zero_extended() {
        // Order must not matter: the longer array can come first or last.
        let a = build_empirical_pmf(&[0.5, 0.1], CAP).unwrap();
        let b = build_empirical_pmf(&[0.1, 0.5], CAP).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(b.len(), 10);

        // Sum before normalizing: 10 * 0.1 + 2 * 0.5 = 2.0
        assert!((a.pmf[0] - 0.3).abs() < 1e-12);
        assert!((a.pmf[1] - 0.3).abs() < 1e-12);
        assert!((a.pmf[2] - 0.05).abs() < 1e-12);
        for (x, y) in a.pmf.iter().zip(&b.pmf) {
            assert!((x - y).abs() < 1e-15);
        }
        assert!((total(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pmf_is_non_increasing() {
        let out = build_empirical_pmf(&[0.5, 0.25, 0.1, 0.01, 0.003], CAP).unwrap();
        for pair in out.pmf.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-15);
        }
        assert_eq!(out.len(), support_len(0.003));
    }

    #[test]
    fn reports_exact_minimum_fraction() {
        let fractions = [0.02, 0.0071, 0.3, 0.0071000001];
        let out = build_empirical_pmf(&fractions, CAP).unwrap();
        assert_eq!(out.min_fraction, 0.0071);
    }

    #[test]
    fn fractions_near_one_stay_small() {
        let out = build_empirical_pmf(&[1.0, 0.99, 0.95, 0.9], CAP).unwrap();
        assert_eq!(out.len(), 2);
        let out = build_empirical_pmf(&[1.0], CAP).unwrap();
        assert_eq!(out.pmf, vec![1.0]);
        assert_eq!(out.support, vec![0.0]);
    }

    #[test]
    fn tiny_fraction_exhausts_resources() {
        let err = build_empirical_pmf(&[0.2, 1e-12], CAP).unwrap_err();
        match &err {
            EstimateError::ResourceExhausted {
                stage,
                required,
                limit,
            } => {
                assert_eq!(*stage, Stage::EmpiricalPmf);
                assert!(*required >= 999_999_999_999, "required={required}");
                assert_eq!(*limit, CAP);
            }
            other => panic!("expected resource exhaustion, got {other:?}"),
        }
        assert!(err.is_recoverable());
    }

    #[test]
    fn subnormal_fraction_saturates() {
        assert_eq!(support_len(1e-320), usize::MAX);
        assert!(matches!(
            build_empirical_pmf(&[1e-320], CAP),
            Err(EstimateError::ResourceExhausted { .. })
        ));
    }

    #[test]
    fn rejects_invalid_observations() {
        assert_eq!(
            build_empirical_pmf(&[], CAP),
            Err(EstimateError::EmptyObservations)
        );
        for (bad, idx) in [(0.0, 1), (-0.2, 1), (1.5, 1)] {
            assert_eq!(
                build_empirical_pmf(&[0.5, bad], CAP),
                Err(EstimateError::InvalidObservation { index: idx, value: bad })
            );
        }
        assert!(matches!(
            build_empirical_pmf(&[f64::NAN], CAP),
            Err(EstimateError::InvalidObservation { index: 0, .. })
        ));
    }

    #[test]
    fn mean_of_uniform() {
        let out = build_empirical_pmf(&[0.25], CAP).unwrap();
        assert!((out.mean() - 1.5).abs() < 1e-12);
    }
}
