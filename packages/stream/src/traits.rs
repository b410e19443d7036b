//! The core trait of the stream layer.

use std::io::SeekFrom;

use bytes::Bytes;

use crate::StreamError;

/// A seekable binary resource with an explicit disposal contract.
///
/// Streams own their backing storage. `dispose` releases it deterministically;
/// after disposal every data operation fails with [`StreamError::Disposed`].
/// Disposal is idempotent.
///
/// `len`, `position` and `is_disposed` are infallible projections and stay
/// callable after disposal (a disposed stream reports length 0).
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Stream>`.
pub trait Stream: Send {
    /// Length of the stream in bytes.
    fn len(&self) -> u64;

    /// Whether the stream holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor position.
    fn position(&self) -> u64;

    /// Move the cursor. Seeking outside `0..=len` fails with
    /// [`StreamError::OutOfRange`].
    ///
    /// # Returns
    ///
    /// The new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError>;

    /// Read up to `buf.len()` bytes at the cursor, advancing it.
    ///
    /// # Returns
    ///
    /// The number of bytes read; `0` at the end of the stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Read exactly `buf.len()` bytes, advancing the cursor.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StreamError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(StreamError::UnexpectedEnd {
                    wanted: buf.len(),
                    read: filled,
                });
            }
            filled += n;
        }
        Ok(())
    }

    /// Write `buf` at the cursor, advancing it. Writing past the end grows
    /// the stream.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

    /// Copy of the full contents, independent of the cursor.
    ///
    /// Used by upper layers for equality checks and serialization; never
    /// mutates the stream.
    fn snapshot(&self) -> Result<Bytes, StreamError>;

    /// Release the backing storage. Idempotent.
    fn dispose(&mut self);

    /// Whether `dispose` has run.
    fn is_disposed(&self) -> bool;
}

// Blanket implementation so boxed streams remain streams.

impl<T: Stream + ?Sized> Stream for Box<T> {
    fn len(&self) -> u64 {
        self.as_ref().len()
    }

    fn position(&self) -> u64 {
        self.as_ref().position()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        self.as_mut().seek(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.as_mut().read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.as_mut().write(buf)
    }

    fn snapshot(&self) -> Result<Bytes, StreamError> {
        self.as_ref().snapshot()
    }

    fn dispose(&mut self) {
        self.as_mut().dispose()
    }

    fn is_disposed(&self) -> bool {
        self.as_ref().is_disposed()
    }
}
