//! Mathematical utilities: exponential densities, grids, and least squares.

pub mod basis;
pub mod grid;
pub mod ols;

pub use basis::*;
pub use grid::*;
pub use ols::*;
