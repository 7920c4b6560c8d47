//! Error types.
//!
//! The library reports failures through [`FitError`]; the `dimfit` binary wraps
//! them into [`AppError`], which additionally carries the process exit code.
//!
//! Exit codes:
//! - `2`: invalid input or configuration
//! - `3`: not enough usable data to fit anything
//! - `4`: internal error

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, FitError>;

/// Failures produced by the fitting engine and the attribute cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Invalid dimension pairing or invalid settings. Never retried.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Unreadable or malformed input data (CSV rows, JSON files).
    #[error("Input error: {0}")]
    Input(String),

    /// An attribute computation produced no value, so nothing was cached.
    #[error("No value available for attribute {0}")]
    MissingValue(String),

    /// A single (fitter, model) combination could not produce a usable result.
    #[error("Fit failed: {0}")]
    FitFailure(String),

    /// Every (fitter, model) combination failed.
    #[error("All {} fitting combinations failed: {}", .failures.len(), .failures.join("; "))]
    TotalFailure { failures: Vec<String> },

    /// A bug in a data provider or in cache bookkeeping.
    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),
}

impl FitError {
    /// True for the null-rejection signal of the attribute cache.
    pub fn is_missing_value(&self) -> bool {
        matches!(self, FitError::MissingValue(_))
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match &err {
            FitError::Configuration(_) | FitError::Input(_) => 2,
            FitError::MissingValue(_) | FitError::FitFailure(_) | FitError::TotalFailure { .. } => 3,
            FitError::InternalConsistency(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
