//! Error types for module loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while loading a module candidate.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The candidate is not a valid module image for the active strategy.
    ///
    /// Batch loading recovers from this locally: the candidate is skipped.
    #[error("malformed module {path}: {reason}")]
    Malformed {
        /// The candidate file.
        path: PathBuf,
        /// What the engine or image check rejected.
        reason: String,
    },

    /// The candidate file could not be read.
    #[error("cannot read module {path}: {source}")]
    Io {
        /// The candidate file.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine for the active strategy could not be created.
    #[error("engine setup failed: {reason}")]
    Engine {
        /// The engine's own description of the failure.
        reason: String,
    },
}
