//! Error types for the stream layer.
//!
//! Errors at this level are about the byte surface only. No semantic errors
//! like "wrong format" - those belong in higher layers.

use thiserror::Error;

/// Errors raised by [`Stream`](crate::Stream) implementations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A data operation was invoked after `dispose`.
    #[error("stream already disposed")]
    Disposed,

    /// A seek targeted a position outside the stream.
    #[error("seek out of range: position {position}, length {len}")]
    OutOfRange {
        /// The requested absolute position.
        position: i64,
        /// The stream length at the time of the seek.
        len: u64,
    },

    /// A fixed-size read ran out of bytes.
    #[error("unexpected end of stream: wanted {wanted} bytes, read {read}")]
    UnexpectedEnd {
        /// Bytes the caller asked for.
        wanted: usize,
        /// Bytes actually available.
        read: usize,
    },

    /// An I/O error from a file-backed construction helper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
