//! Common error types used throughout the RUSH output.
//!
//! Start-up failures, sink acquisition failures, and configuration problems
//! all funnel into [`Error`]. Write failures on an open sink never reach this
//! type: they are logged on the packet path and otherwise ignored.

use std::path::PathBuf;

/// Common error type for the RUSH output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host refused to let the output begin capturing.
    #[error("Capture not permitted by host")]
    CaptureNotPermitted,

    /// The host could not initialize the audio/video encoders.
    #[error("Encoder initialization failed")]
    EncoderInit,

    /// Start was requested while a session is still capturing or stopping.
    #[error("Output already active")]
    AlreadyActive,

    /// The output destination could not be opened.
    #[error("Sink unavailable [{path}]: {source}")]
    SinkUnavailable {
        /// Destination that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new SinkUnavailable error.
    pub fn sink_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is one of the host-side start-up refusals.
    ///
    /// These are the failures the host reports as a plain "start failed"
    /// without any state change or output.
    pub fn is_startup_failure(&self) -> bool {
        matches!(self, Self::CaptureNotPermitted | Self::EncoderInit)
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
