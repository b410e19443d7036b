//! Error types for the core layer.

use thiserror::Error;

use crate::format::FormatKind;

/// Result type alias for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by node lifecycle operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The node was used after `dispose`.
    #[error("node already disposed")]
    Disposed,

    /// A node name failed validation.
    ///
    /// Names are path segments: they must be non-empty and must not
    /// contain `/`.
    #[error("invalid node name: {name:?}")]
    InvalidName { name: String },

    /// A transform was requested on a node that holds no format.
    #[error("cannot transform a node without format")]
    MissingFormat,

    /// A converter invocation failed. The node's format is unchanged.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConvertError),
}

/// Errors raised while dispatching or running a converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Discovery could not locate a converter for the pair.
    #[error("no converter found for {source} -> {dest}")]
    NoConverter {
        /// Kind of the format being converted.
        source: FormatKind,
        /// Requested destination kind.
        dest: FormatKind,
    },

    /// The converter's declared source does not match the format it was
    /// handed.
    #[error("converter expects {expected} source, format is {actual}")]
    SourceMismatch {
        /// Source kind the converter is typed for.
        expected: FormatKind,
        /// Kind of the format actually supplied.
        actual: FormatKind,
    },

    /// The converter itself failed; wraps the underlying cause.
    #[error("converter failed: {source}")]
    Failed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ConvertError {
    /// Wrap an arbitrary cause as a converter failure.
    pub fn failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ConvertError::Failed {
            source: cause.into(),
        }
    }
}
