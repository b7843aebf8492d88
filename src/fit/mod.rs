//! Estimation pipeline.
//!
//! Responsibilities:
//!
//! - build the empirical disturbance-interval PMF per unit (`empirical`)
//! - fit the bounded exponential mixture to it (`fitter`)
//! - drive both over every unit of a table, skipping failed units (`units`)

pub mod empirical;
pub mod fitter;
pub mod units;

pub use empirical::*;
pub use fitter::*;
pub use units::*;
