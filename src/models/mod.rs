//! Exponential mixture model implementation.
//!
//! The model is a set of small, pure functions so the fitter and reports can
//! share it.

pub mod model;

pub use model::*;
