//! Growable in-memory stream.

use std::io::SeekFrom;
use std::path::Path;

use bytes::{Bytes, BytesMut};

use crate::{Stream, StreamError};

/// An in-memory [`Stream`] over a growable buffer.
///
/// Writing past the end extends the buffer; reading at the end returns 0.
/// `dispose` drops the buffer and invalidates further data operations.
#[derive(Debug, Default)]
pub struct MemoryStream {
    buffer: BytesMut,
    position: u64,
    disposed: bool,
}

impl MemoryStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream over a copy of `data`, cursor at the start.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            buffer: BytesMut::from(&data[..]),
            position: 0,
            disposed: false,
        }
    }

    /// Create a stream over the contents of a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(data))
    }

    fn check_disposed(&self) -> Result<(), StreamError> {
        if self.disposed {
            Err(StreamError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl Stream for MemoryStream {
    fn len(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        self.check_disposed()?;
        let len = self.buffer.len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => len + n,
            SeekFrom::Current(n) => self.position as i64 + n,
        };
        if target < 0 || target > len {
            return Err(StreamError::OutOfRange {
                position: target,
                len: self.buffer.len() as u64,
            });
        }
        self.position = target as u64;
        Ok(self.position)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.check_disposed()?;
        let pos = self.position as usize;
        if pos >= self.buffer.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.buffer.len() - pos);
        buf[..n].copy_from_slice(&self.buffer[pos..pos + n]);
        self.position += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.check_disposed()?;
        let pos = self.position as usize;
        let end = pos + buf.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[pos..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn snapshot(&self) -> Result<Bytes, StreamError> {
        self.check_disposed()?;
        Ok(Bytes::copy_from_slice(&self.buffer))
    }

    fn dispose(&mut self) {
        self.buffer = BytesMut::new();
        self.position = 0;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
