//! errors.rs - Custom error types for the envfilter-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that a host can surface as the cause of a
//! failed build.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// The reason attached to a [`EnvFilterError::Filter`] raised by the `Fail` action.
pub const PROHIBITED_VALUE_REASON: &str = "matched prohibited value";

/// This enum represents all possible error types in the `envfilter-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EnvFilterError {
    #[error("Failed to compile pattern '{0}': {1}")]
    PatternCompilation(String, regex::Error),

    #[error("Pattern length ({0}) exceeds maximum allowed ({1})")]
    PatternLengthExceeded(usize, usize),

    /// A variable value tripped a rule whose action is `Fail`.
    #[error("Environment variable '{key}' {reason}")]
    Filter { key: String, reason: String },

    /// No workspace (or no scoped temporary directory) was available during setup.
    #[error("{0}")]
    FatalSetup(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to serialize: {0}")]
    Serialization(String),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

impl EnvFilterError {
    /// Builds the error raised when a value matches a `Fail` rule.
    pub fn prohibited(key: impl Into<String>) -> Self {
        EnvFilterError::Filter {
            key: key.into(),
            reason: PROHIBITED_VALUE_REASON.to_string(),
        }
    }

    /// True for errors caused by an unusable match pattern.
    pub fn is_pattern_error(&self) -> bool {
        matches!(
            self,
            EnvFilterError::PatternCompilation(..) | EnvFilterError::PatternLengthExceeded(..)
        )
    }

    /// The offending variable name, if this error came from a `Fail` action.
    pub fn filtered_key(&self) -> Option<&str> {
        match self {
            EnvFilterError::Filter { key, .. } => Some(key),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnvFilterError>;
