//! Error types for chroma enhancement

use std::fmt;

/// Errors that can occur while loading or enhancing a chromagram
#[derive(Debug, Clone, PartialEq)]
pub enum ChromaError {
    /// Global maximum is zero, so the matrix cannot be normalized
    DegenerateInputError(String),

    /// Matrix does not have 12 pitch-class rows or has no frames
    DimensionError(String),

    /// Invalid values or parameters (NaN, negative energy, bad config)
    InvalidInput(String),

    /// Malformed delimited table
    ParseError(String),

    /// Reading or writing a table failed
    IoError(String),
}

impl fmt::Display for ChromaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChromaError::DegenerateInputError(msg) => write!(f, "Degenerate input: {}", msg),
            ChromaError::DimensionError(msg) => write!(f, "Dimension error: {}", msg),
            ChromaError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ChromaError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ChromaError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ChromaError {}
