//! Relationships between dimensions of an instance's run data.
//!
//! - `matrix`: gather the `(x, y)` samples of a dimension pair
//! - `model`: cached attributes that fit and share the best model

pub mod matrix;
pub mod model;

pub use matrix::*;
pub use model::*;
