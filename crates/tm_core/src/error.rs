//! Error types for the telemetry core.
//!
//! None of these ever cross the host boundary: the adapter callbacks log
//! and discard them so a logging failure can never end a match.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`TelemetryError`].
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Top-level error type for telemetry output and configuration.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to open or write an output file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to an already open stream.
    #[error("Stream write failed: {0}")]
    Write(#[from] std::io::Error),

    /// Failed to serialize the outcome record.
    #[error("Failed to serialize outcome: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Config file could not be parsed.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// No output path configured for a stream that was asked to write.
    #[error("No output path configured for {0}")]
    NoOutputPath(&'static str),
}

impl TelemetryError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
