//! Two-component exponential mixture.
//!
//! `g(x; w, s1, s2) = w·p(x, s1) + (1 − w)·p(x, s2)`
//!
//! The fitter relies on two primitive operations:
//! - predict `g(x)` for residuals
//! - fill a Jacobian row `[∂g/∂w, ∂g/∂s1, ∂g/∂s2]`

use crate::domain::MixtureParams;
use crate::math::{exponential_pdf, exponential_pdf_and_scale_grad, exponential_sf};

/// Number of free parameters `(w, scale1, scale2)`.
pub const PARAM_COUNT: usize = 3;

/// Mixture density at `x`.
pub fn mixture_pdf(x: f64, params: &MixtureParams) -> f64 {
    params.w * exponential_pdf(x, params.scale1)
        + (1.0 - params.w) * exponential_pdf(x, params.scale2)
}

/// Fill the Jacobian row at `x` and return `g(x)`.
///
/// # Panics
/// Panics if `out.len() < PARAM_COUNT`.
pub fn fill_jacobian_row(x: f64, params: &MixtureParams, out: &mut [f64]) -> f64 {
    let (p1, d1) = exponential_pdf_and_scale_grad(x, params.scale1);
    let (p2, d2) = exponential_pdf_and_scale_grad(x, params.scale2);
    out[0] = p1 - p2;
    out[1] = params.w * d1;
    out[2] = (1.0 - params.w) * d2;
    params.w * p1 + (1.0 - params.w) * p2
}

/// Expected recurrence interval (years) under the mixture.
pub fn mixture_mean(params: &MixtureParams) -> f64 {
    params.w * params.scale1 + (1.0 - params.w) * params.scale2
}

/// Probability that more than `x` years pass without fire.
pub fn mixture_survival(x: f64, params: &MixtureParams) -> f64 {
    params.w * exponential_sf(x, params.scale1) + (1.0 - params.w) * exponential_sf(x, params.scale2)
}
