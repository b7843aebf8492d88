//! `wildfire-recurrence` library crate.
//!
//! Estimates wildfire recurrence-interval distributions for ecological units
//! (ecozones, ecoprovinces, ecoregions) from annual burned-area fractions:
//!
//! 1. `fit::build_empirical_pmf` turns a unit's annual fractions into a PMF over
//!    years since the last fire
//! 2. `fit::fit_mixture` fits a bounded two-component exponential mixture to it
//! 3. `fit::fit_wildfire_statistics` runs both for every unit of a table
//!
//! The binary (`wfr`) is a thin wrapper around this library.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{EstimateConfig, FitResults, MixtureParams, Observation, UnitFit};
pub use error::EstimateError;
pub use fit::{build_empirical_pmf, fit_wildfire_statistics};
