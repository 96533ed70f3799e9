//! Error types for placeholder configuration

use thiserror::Error;

/// Errors that can occur while configuring placeholder handling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    /// Unknown grammar name in configuration
    #[error("Unknown placeholder grammar: {0} (expected \"single\" or \"double\")")]
    UnknownGrammar(String),
}

/// Result type for placeholder operations
pub type Result<T> = std::result::Result<T, PlaceholderError>;
