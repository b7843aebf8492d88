//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input rows (`Observation`) and the eco level they are grouped by
//! - fit outputs (`MixtureParams`, `UnitFit`, `FitResults`)
//! - run configuration (`EstimateConfig`, `RunConfig`)
//! - the ecozone name table used in reports

pub mod ecozones;
pub mod types;

pub use ecozones::*;
pub use types::*;
