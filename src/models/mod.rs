//! Parametric model families and the catalog that picks them.
//!
//! Models are small, pure types behind the `ParametricModel` trait so that the
//! fitting code can stay generic.

pub mod catalog;
pub mod exp_decay;
pub mod logistic;
pub mod model;
pub mod quadratic;

pub use catalog::*;
pub use exp_decay::*;
pub use logistic::*;
pub use model::*;
pub use quadratic::*;
