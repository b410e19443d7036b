//! Byte streams for formfs: the raw binary layer under every leaf format.
//!
//! This crate knows nothing about formats or nodes. It provides:
//! - [`Stream`]: an object-safe read/write/seek surface with an explicit
//!   disposal contract
//! - [`MemoryStream`]: a growable in-memory implementation
//!
//! Upper layers hold a `Box<dyn Stream>` and forward disposal; they never
//! interpret the bytes.

pub use bytes::Bytes;

mod error;
mod memory;
mod traits;

pub use error::StreamError;
pub use memory::MemoryStream;
pub use traits::Stream;

pub use std::io::SeekFrom;
