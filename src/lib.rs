//! `dim-curves` library crate.
//!
//! Fits and caches relationship models between dimensions (time measures and
//! objective values) of repeated optimization-algorithm runs.
//!
//! The binary (`dimfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the cache and fitting engine are reusable from other tools

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod relation;
pub mod report;
