//! Error types for rush-media.

use std::io;
use thiserror::Error;

/// Result type for rush-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for rush-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Frame ended before all of its fields were present.
    #[error("Truncated frame: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    /// Frame structure is inconsistent.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

impl Error {
    /// Create an invalid frame error.
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }
}
