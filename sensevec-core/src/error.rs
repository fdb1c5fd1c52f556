//! Error types for sensevec-core.

use thiserror::Error;

/// Result type for sensevec-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sensevec-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A span or token offset falls outside the document.
    #[error("Offset out of bounds: {0}")]
    OutOfBounds(String),

    /// Spans passed to a retokenization overlap.
    #[error("Overlapping spans: {0}")]
    Overlap(String),
}

impl Error {
    /// Create an out-of-bounds error.
    #[must_use]
    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        Self::OutOfBounds(msg.into())
    }

    /// Create an overlap error.
    #[must_use]
    pub fn overlap(msg: impl Into<String>) -> Self {
        Self::Overlap(msg.into())
    }
}
