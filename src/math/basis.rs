//! Exponential density primitives.
//!
//! With scale `s` the exponential density is:
//!
//! - `p(x, s) = exp(-x/s) / s` for `x >= 0`, `0` otherwise
//!
//! and its derivative with respect to the scale is:
//!
//! - `dp/ds(x, s) = exp(-x/s) * (x - s) / s^3`
//!
//! Both are evaluated from a single `exp` so the fitter can share it.

/// Exponential density at `x` with scale `scale`.
pub fn exponential_pdf(x: f64, scale: f64) -> f64 {
    if x < 0.0 {
        return 0.0;
    }
    (-x / scale).exp() / scale
}

/// `(p(x, s), dp/ds(x, s))` in one pass.
pub fn exponential_pdf_and_scale_grad(x: f64, scale: f64) -> (f64, f64) {
    if x < 0.0 {
        return (0.0, 0.0);
    }
    let e = (-x / scale).exp();
    let pdf = e / scale;
    let grad = e * (x - scale) / (scale * scale * scale);
    (pdf, grad)
}

/// Survival function `P(X > x) = exp(-x/s)`.
pub fn exponential_sf(x: f64, scale: f64) -> f64 {
    if x < 0.0 {
        return 1.0;
    }
    (-x / scale).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_matches_closed_form() {
        assert!((exponential_pdf(0.0, 2.0) - 0.5).abs() < 1e-15);
        assert!((exponential_pdf(2.0, 2.0) - 0.5 * (-1.0f64).exp()).abs() < 1e-15);
        assert_eq!(exponential_pdf(-1.0, 2.0), 0.0);
        assert_eq!(exponential_sf(-1.0, 2.0), 1.0);
    }

    #[test]
    fn scale_grad_matches_finite_difference() {
        let h = 1e-6;
        for &s in &[1.0, 3.5, 40.0] {
            for &x in &[0.0, 0.5, 4.0, 100.0] {
                let (_, g) = exponential_pdf_and_scale_grad(x, s);
                let fd = (exponential_pdf(x, s + h) - exponential_pdf(x, s - h)) / (2.0 * h);
                assert!((g - fd).abs() < 1e-7, "x={x} s={s}: {g} vs {fd}");
            }
        }
    }
}
