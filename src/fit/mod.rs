//! Curve fitting.
//!
//! Responsibilities:
//!
//! - score parameter vectors with a weighted relative-error quality measure
//! - search parameters with Levenberg–Marquardt and Nelder–Mead fitters
//! - run every (fitter, model) combination in parallel and keep the best

pub mod engine;
pub mod fitter;
pub mod lm;
pub mod orchestrator;
pub mod quality;
pub mod result;
pub mod simplex;

pub use engine::*;
pub use fitter::{Fitter, FitterSettings, FittingJob};
pub use lm::*;
pub use orchestrator::*;
pub use quality::*;
pub use result::*;
pub use simplex::*;
