//! Mathematical utilities: least squares, power terms, order statistics.

pub mod ols;
pub mod power;
pub mod stats;

pub use ols::*;
pub use power::*;
pub use stats::*;
