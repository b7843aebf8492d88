//! Error types.
//!
//! - `EstimateError`: typed failures of the estimation core (builder + fitter).
//! - `AppError`: what the binary reports, carrying a process exit code.

use std::fmt;

/// Pipeline stage that produced an error (used in skip warnings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EmpiricalPmf,
    CurveFit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::EmpiricalPmf => write!(f, "empirical pmf"),
            Stage::CurveFit => write!(f, "curve fit"),
        }
    }
}

/// Failures of the estimation core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    /// No observations were supplied for a unit.
    #[error("no burn-fraction observations")]
    EmptyObservations,

    /// A burn fraction outside `(0, 1]` (or non-finite).
    #[error("invalid burn fraction {value} at index {index} (must be finite and in (0, 1])")]
    InvalidObservation { index: usize, value: f64 },

    /// A working array would exceed its configured cap, or allocating it failed.
    #[error("{stage} needs {required} points, limit is {limit}")]
    ResourceExhausted {
        stage: Stage,
        required: usize,
        limit: usize,
    },

    /// The least-squares solver ran out of function evaluations.
    #[error("curve fit did not converge after {evaluations} evaluations")]
    NotConverged { evaluations: usize },

    /// The model produced NaN/inf during fitting.
    #[error("curve fit produced non-finite values")]
    NonFinite,

    /// Invalid estimator settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EstimateError {
    /// Per-unit failures are skipped; anything else aborts the batch.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EstimateError::InvalidConfig(_))
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        let code = match err {
            EstimateError::InvalidConfig(_) => 2,
            EstimateError::EmptyObservations => 3,
            _ => 4,
        };
        AppError::new(code, err.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_exhaustion_is_recoverable() {
        let err = EstimateError::ResourceExhausted {
            stage: Stage::EmpiricalPmf,
            required: 10,
            limit: 5,
        };
        assert!(err.is_recoverable());
        assert!(!EstimateError::InvalidConfig("x".into()).is_recoverable());
        assert_eq!(err.to_string(), "empirical pmf needs 10 points, limit is 5");
    }

    #[test]
    fn app_error_exit_codes() {
        assert_eq!(AppError::from(EstimateError::InvalidConfig("x".into())).exit_code(), 2);
        assert_eq!(AppError::from(EstimateError::NonFinite).exit_code(), 4);
    }
}
