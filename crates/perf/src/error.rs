// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for bmd-perf
//!
//! Errors raised by the wrappers themselves. Whatever the wrapped function
//! returns is handed back untouched inside `Ok(..)`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for wrapper operations
pub type PerfResult<T> = Result<T, PerfError>;

/// Errors that can occur while preparing, recording or persisting a session
#[derive(Debug, Error)]
pub enum PerfError {
    /// The log directory could not be created
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or writing a log file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The log file already exists and the collision policy forbids reuse
    #[error("Log file already exists: {0}")]
    LogFileExists(PathBuf),

    /// The host program path has no file name component
    #[error("Invalid host program path: {0}")]
    InvalidHostProgram(PathBuf),

    /// An option mapping could not be decoded
    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    /// A recording session is already running on this thread
    #[error("A recording session is already active")]
    SessionActive,

    /// The sampling profiler failed to start or to build its report
    #[cfg(feature = "profiler")]
    #[error("Profiler error: {0}")]
    Profiler(#[from] pprof::Error),

    /// The recorded data could not be encoded
    #[error("Failed to encode recording: {0}")]
    Encode(String),

    /// The requested output format is not compiled into this build
    #[error("Output format '{0}' is not supported by this build")]
    UnsupportedFormat(&'static str),
}

impl PerfError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PerfError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = PerfError::LogFileExists(PathBuf::from("logs/cprofile/app/add_1.prof"));
        let msg = err.to_string();
        assert!(msg.contains("already exists"));
        assert!(msg.contains("add_1.prof"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = PerfError::io(
            "logs/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("logs/x"));
    }
}
