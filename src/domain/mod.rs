//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - typed dimensions (`Dimension`, `DimensionKind`)
//! - run data and its owner (`Run`, `InstanceRuns`)
//! - the `(x, y)` sample table handed to the fitters (`DataMatrix`)
//! - run configurations derived from the CLI

pub mod runs;
pub mod types;

pub use runs::*;
pub use types::*;
