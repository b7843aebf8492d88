//! Bounded nonlinear least squares for the exponential mixture.
//!
//! Given support years `x_i` and empirical probabilities `y_i`, we minimize
//!
//! ```text
//! F(p) = ½ Σ (g(x_i; p) - y_i)^2,   p = (w, s1, s2)
//! ```
//!
//! subject to `0 <= w <= 1`, `s1 >= 1`, `s2 >= 1`, with a projected
//! Levenberg–Marquardt iteration:
//!
//! - solve `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr` for the free parameters
//! - parameters sitting on a bound with the gradient pushing outward are frozen
//! - the trial point is projected back onto the box
//! - accepted steps shrink λ by 10, rejected steps grow it by 10
//!
//! Termination mirrors the usual MINPACK-style tests (`ftol`, `xtol`, `gtol`).
//! Everything is deterministic given the same inputs and options.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use tracing::{debug, trace};

use crate::domain::MixtureParams;
use crate::error::{EstimateError, Stage};
use crate::math::solve_least_squares;
use crate::models::{PARAM_COUNT, fill_jacobian_row, mixture_pdf};

/// Lower bounds for `(w, scale1, scale2)`.
pub const LOWER_BOUNDS: [f64; PARAM_COUNT] = [0.0, 1.0, 1.0];
/// Upper bounds for `(w, scale1, scale2)`.
pub const UPPER_BOUNDS: [f64; PARAM_COUNT] = [1.0, f64::INFINITY, f64::INFINITY];

const DAMPING_FACTOR: f64 = 10.0;
const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e16;
/// Floor for the Marquardt scaling of a column with (near) zero curvature.
const DIAG_FLOOR: f64 = 1e-12;

/// Solver settings.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Longest PMF the fitter accepts (rows of the Jacobian).
    pub max_fit_points: usize,
    /// Budget of cost evaluations before giving up.
    pub max_evaluations: usize,
    /// Relative cost reduction tolerance.
    pub ftol: f64,
    /// Relative step size tolerance.
    pub xtol: f64,
    /// Projected gradient tolerance (∞-norm).
    pub gtol: f64,
    /// Starting damping λ.
    pub initial_damping: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_fit_points: 10_000_000,
            max_evaluations: 100 * PARAM_COUNT,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            initial_damping: 1e-3,
        }
    }
}

impl FitOptions {
    pub fn validate(&self) -> Result<(), EstimateError> {
        if self.max_fit_points == 0 {
            return Err(EstimateError::InvalidConfig(
                "max_fit_points must be > 0".to_string(),
            ));
        }
        if self.max_evaluations == 0 {
            return Err(EstimateError::InvalidConfig(
                "max_evaluations must be > 0".to_string(),
            ));
        }
        for (name, v) in [
            ("ftol", self.ftol),
            ("xtol", self.xtol),
            ("gtol", self.gtol),
            ("initial_damping", self.initial_damping),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(EstimateError::InvalidConfig(format!(
                    "{name} must be finite and > 0 (got {v})"
                )));
            }
        }
        Ok(())
    }
}

/// Which test stopped the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Ftol,
    Xtol,
    Gtol,
}

/// Converged mixture fit.
#[derive(Debug, Clone)]
pub struct MixtureFit {
    pub params: MixtureParams,
    /// `½ Σ r_i^2` at the solution.
    pub cost: f64,
    pub rmse: f64,
    pub evaluations: usize,
    pub termination: Termination,
}

/// Default start point.
///
/// `w = 0.5`, `scale1 = mean/2`, `scale2 = 2·mean` (clamped to the bounds),
/// where `mean` is the PMF-weighted mean of `x`.
pub fn initial_guess(x: &[f64], y: &[f64]) -> MixtureParams {
    let mass: f64 = y.iter().sum();
    let mean = if mass > 0.0 && mass.is_finite() {
        x.iter().zip(y).map(|(xi, yi)| xi * yi).sum::<f64>() / mass
    } else {
        1.0
    };
    let mean = if mean.is_finite() { mean } else { 1.0 };
    MixtureParams::from_array(project([0.5, mean / 2.0, 2.0 * mean]))
}

/// Fit the mixture to `(x, y)` starting from `initial_guess`.
pub fn fit_mixture(x: &[f64], y: &[f64], opts: &FitOptions) -> Result<MixtureFit, EstimateError> {
    fit_mixture_from(x, y, initial_guess(x, y), opts)
}

/// Fit the mixture to `(x, y)` from an explicit start point.
pub fn fit_mixture_from(
    x: &[f64],
    y: &[f64],
    start: MixtureParams,
    opts: &FitOptions,
) -> Result<MixtureFit, EstimateError> {
    if x.len() != y.len() {
        return Err(EstimateError::InvalidConfig(format!(
            "x/y length mismatch: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(EstimateError::EmptyObservations);
    }

    let n = x.len();
    let mut jac = allocate_jacobian(n, opts.max_fit_points)?;
    let mut resid = DVector::<f64>::zeros(n);

    let mut p = project(start.to_array());
    let mut cost = fill_residuals_and_jacobian(x, y, &p, &mut resid, &mut jac);
    let mut evaluations = 1usize;
    if !cost.is_finite() {
        return Err(EstimateError::NonFinite);
    }

    let mut lambda = opts.initial_damping;

    let termination = 'outer: loop {
        let jtr = jac.tr_mul(&resid);
        let grad = Vector3::new(jtr[0], jtr[1], jtr[2]);
        let active = active_bounds(&p, &grad);

        let proj_grad_norm = (0..PARAM_COUNT)
            .filter(|&i| !active[i])
            .map(|i| grad[i].abs())
            .fold(0.0, f64::max);
        if proj_grad_norm <= opts.gtol {
            break Termination::Gtol;
        }

        let jtj_dyn = jac.tr_mul(&jac);
        let jtj = Matrix3::from_fn(|i, j| jtj_dyn[(i, j)]);

        loop {
            if evaluations >= opts.max_evaluations {
                return Err(EstimateError::NotConverged { evaluations });
            }

            let Some(delta) = damped_step(&jtj, &grad, &active, lambda) else {
                lambda *= DAMPING_FACTOR;
                if lambda > MAX_DAMPING {
                    break 'outer Termination::Xtol;
                }
                continue;
            };

            let trial = project([p[0] + delta[0], p[1] + delta[1], p[2] + delta[2]]);
            let step_norm = norm(&[trial[0] - p[0], trial[1] - p[1], trial[2] - p[2]]);
            if step_norm <= opts.xtol * (opts.xtol + norm(&p)) {
                break 'outer Termination::Xtol;
            }

            let trial_cost = cost_at(x, y, &trial);
            evaluations += 1;

            if trial_cost.is_finite() && trial_cost < cost {
                let reduction = cost - trial_cost;
                let previous = cost;
                p = trial;
                cost = fill_residuals_and_jacobian(x, y, &p, &mut resid, &mut jac);
                lambda = (lambda / DAMPING_FACTOR).max(MIN_DAMPING);
                trace!(evaluations, cost, lambda, w = p[0], scale1 = p[1], scale2 = p[2], "accepted step");

                if reduction <= opts.ftol * previous {
                    break 'outer Termination::Ftol;
                }
                break;
            }

            lambda *= DAMPING_FACTOR;
            if lambda > MAX_DAMPING {
                break 'outer Termination::Xtol;
            }
        }
    };

    if !p.iter().all(|v| v.is_finite()) || !cost.is_finite() {
        return Err(EstimateError::NonFinite);
    }

    let params = MixtureParams::from_array(p);
    let rmse = (2.0 * cost / n as f64).sqrt();
    debug!(
        evaluations,
        cost,
        termination = ?termination,
        w = params.w,
        scale1 = params.scale1,
        scale2 = params.scale2,
        "mixture fit finished"
    );

    Ok(MixtureFit {
        params,
        cost,
        rmse,
        evaluations,
        termination,
    })
}

/// Allocate an `n × 3` Jacobian, reporting oversize/failed allocation as exhaustion.
fn allocate_jacobian(n: usize, max_fit_points: usize) -> Result<DMatrix<f64>, EstimateError> {
    let exhausted = EstimateError::ResourceExhausted {
        stage: Stage::CurveFit,
        required: n,
        limit: max_fit_points,
    };
    if n > max_fit_points {
        return Err(exhausted);
    }
    let len = n.checked_mul(PARAM_COUNT).ok_or_else(|| exhausted.clone())?;
    let mut buf: Vec<f64> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| exhausted)?;
    buf.resize(len, 0.0);
    Ok(DMatrix::from_vec(n, PARAM_COUNT, buf))
}

/// Fill `resid = g(x) - y` and `jac`, returning the cost.
fn fill_residuals_and_jacobian(
    x: &[f64],
    y: &[f64],
    p: &[f64; PARAM_COUNT],
    resid: &mut DVector<f64>,
    jac: &mut DMatrix<f64>,
) -> f64 {
    let params = MixtureParams::from_array(*p);
    let mut row = [0.0; PARAM_COUNT];
    let mut sse = 0.0;
    for (i, (&xi, &yi)) in x.iter().zip(y).enumerate() {
        let g = fill_jacobian_row(xi, &params, &mut row);
        for (k, v) in row.iter().enumerate() {
            jac[(i, k)] = *v;
        }
        let r = g - yi;
        resid[i] = r;
        sse += r * r;
    }
    0.5 * sse
}

fn cost_at(x: &[f64], y: &[f64], p: &[f64; PARAM_COUNT]) -> f64 {
    let params = MixtureParams::from_array(*p);
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = mixture_pdf(xi, &params) - yi;
            r * r
        })
        .sum();
    0.5 * sse
}

/// Parameters on a bound whose descent direction leaves the box.
fn active_bounds(p: &[f64; PARAM_COUNT], grad: &Vector3<f64>) -> [bool; PARAM_COUNT] {
    let mut active = [false; PARAM_COUNT];
    for i in 0..PARAM_COUNT {
        // Descent moves against the gradient.
        let at_lower = p[i] <= LOWER_BOUNDS[i] && grad[i] > 0.0;
        let at_upper = p[i] >= UPPER_BOUNDS[i] && grad[i] < 0.0;
        active[i] = at_lower || at_upper;
    }
    active
}

/// Solve the damped normal equations over the free parameters.
fn damped_step(
    jtj: &Matrix3<f64>,
    grad: &Vector3<f64>,
    active: &[bool; PARAM_COUNT],
    lambda: f64,
) -> Option<[f64; PARAM_COUNT]> {
    let mut a = DMatrix::<f64>::zeros(PARAM_COUNT, PARAM_COUNT);
    let mut b = DVector::<f64>::zeros(PARAM_COUNT);
    for i in 0..PARAM_COUNT {
        if active[i] {
            a[(i, i)] = 1.0;
            continue;
        }
        for j in 0..PARAM_COUNT {
            if !active[j] {
                a[(i, j)] = jtj[(i, j)];
            }
        }
        a[(i, i)] += lambda * jtj[(i, i)].max(DIAG_FLOOR);
        b[i] = -grad[i];
    }

    let delta = solve_least_squares(&a, &b)?;
    Some([delta[0], delta[1], delta[2]])
}

fn project(p: [f64; PARAM_COUNT]) -> [f64; PARAM_COUNT] {
    let mut out = p;
    for i in 0..PARAM_COUNT {
        out[i] = out[i].clamp(LOWER_BOUNDS[i], UPPER_BOUNDS[i]);
    }
    out
}

fn norm(v: &[f64; PARAM_COUNT]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::build_empirical_pmf;

    fn sample(params: &MixtureParams, n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y = x.iter().map(|&xi| mixture_pdf(xi, params)).collect();
        (x, y)
    }

    fn assert_in_bounds(p: &MixtureParams) {
        assert!((0.0..=1.0).contains(&p.w), "w={}", p.w);
        assert!(p.scale1 >= 1.0, "scale1={}", p.scale1);
        assert!(p.scale2 >= 1.0, "scale2={}", p.scale2);
    }

    #[test]
    fn recovers_known_mixture() {
        let truth = MixtureParams::new(0.7, 3.0, 40.0);
        let (x, y) = sample(&truth, 300);
        let opts = FitOptions {
            max_evaluations: 2_000,
            ..FitOptions::default()
        };
        let fit = fit_mixture(&x, &y, &opts).unwrap();
        assert_in_bounds(&fit.params);

        // Components may come out swapped.
        let p = if fit.params.scale1 <= fit.params.scale2 {
            fit.params
        } else {
            MixtureParams::new(1.0 - fit.params.w, fit.params.scale2, fit.params.scale1)
        };
        assert!((p.w - 0.7).abs() < 1e-2, "{p:?}");
        assert!((p.scale1 - 3.0).abs() < 0.15, "{p:?}");
        assert!((p.scale2 - 40.0).abs() < 2.0, "{p:?}");
        assert!(fit.rmse < 1e-4);
    }

    #[test]
    fn fits_empirical_pmf_within_bounds() {
        let pmf = build_empirical_pmf(&[0.5, 0.25, 0.1], 1_000).unwrap();
        let fit = fit_mixture(&pmf.support, &pmf.pmf, &FitOptions::default()).unwrap();
        assert_in_bounds(&fit.params);
        assert!(fit.cost.is_finite());
    }

    #[test]
    fn single_point_pmf_hits_lower_scale_bound() {
        let fit = fit_mixture(&[0.0], &[1.0], &FitOptions::default()).unwrap();
        assert_in_bounds(&fit.params);
        assert!(fit.cost < 1e-6, "cost={}", fit.cost);
    }

    #[test]
    fn start_point_is_clamped() {
        let start = initial_guess(&[0.0, 1.0], &[0.5, 0.5]);
        assert_eq!(start.w, 0.5);
        assert_eq!(start.scale1, 1.0);
        assert_eq!(start.scale2, 1.0);
        assert_in_bounds(&initial_guess(&[], &[]));
    }

    #[test]
    fn deterministic() {
        let pmf = build_empirical_pmf(&[0.05, 0.002, 0.3, 0.01], 10_000).unwrap();
        let a = fit_mixture(&pmf.support, &pmf.pmf, &FitOptions::default());
        let b = fit_mixture(&pmf.support, &pmf.pmf, &FitOptions::default());
        match (a, b) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.params, b.params);
                assert_eq!(a.evaluations, b.evaluations);
            }
            (Err(a), Err(b)) => assert_eq!(a, b),
            (a, b) => panic!("diverging outcomes: {a:?} vs {b:?}"),
        }
    }

    #[test]
    fn oversized_pmf_exhausts_resources() {
        let x = vec![0.0; 11];
        let y = vec![0.1; 11];
        let opts = FitOptions {
            max_fit_points: 10,
            ..FitOptions::default()
        };
        assert_eq!(
            fit_mixture(&x, &y, &opts).unwrap_err(),
            EstimateError::ResourceExhausted {
                stage: Stage::CurveFit,
                required: 11,
                limit: 10,
            }
        );
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let truth = MixtureParams::new(0.4, 2.0, 80.0);
        let (x, y) = sample(&truth, 200);
        let opts = FitOptions {
            max_evaluations: 1,
            ..FitOptions::default()
        };
        assert_eq!(
            fit_mixture(&x, &y, &opts).unwrap_err(),
            EstimateError::NotConverged { evaluations: 1 }
        );
    }

    #[test]
    fn rejects_mismatched_inputs() {
        assert!(matches!(
            fit_mixture(&[0.0, 1.0], &[1.0], &FitOptions::default()),
            Err(EstimateError::InvalidConfig(_))
        ));
        assert_eq!(
            fit_mixture(&[], &[], &FitOptions::default()).unwrap_err(),
            EstimateError::EmptyObservations
        );
    }

    #[test]
    fn options_validation() {
        assert!(FitOptions::default().validate().is_ok());
        let bad = FitOptions {
            ftol: 0.0,
            ..FitOptions::default()
        };
        assert!(bad.validate().is_err());
    }
}
