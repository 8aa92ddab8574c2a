//! Scramble error types

use thiserror::Error;

/// Errors raised while building scramble components
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrambleError {
    /// An alphabet needs at least one glyph to substitute with
    #[error("Alphabet must contain at least one glyph")]
    EmptyAlphabet,

    /// A configuration value is out of range
    #[error("Invalid scramble configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for scramble operations
pub type Result<T> = std::result::Result<T, ScrambleError>;
