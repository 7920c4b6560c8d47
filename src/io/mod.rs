//! Input/output helpers.
//!
//! - run CSV ingest + validation (`ingest`)
//! - JSON snapshot of permanent cache entries (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
