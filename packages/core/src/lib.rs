//! Core formfs: nodes with swappable format payloads.
//!
//! A [`Node`] is a tree unit that owns at most one [`Format`] at a time - a
//! binary stream, a container of child nodes, or a structured [`Value`].
//! Changing the format keeps the tree consistent: a container expands into
//! child nodes, a non-container collapses them. [`Converter`] implementations
//! transform one format payload into another, dispatched statically through
//! generics or dynamically through [`ErasedConverter`] handles found by a
//! [`ConverterResolver`].
//!
//! # Example
//!
//! ```rust
//! use formfs_core::{BinaryFormat, ContainerFormat, Node};
//!
//! fn build_root() -> Result<Node, formfs_core::Error> {
//!     let mut container = ContainerFormat::new();
//!     container.add(Node::with_format("data", BinaryFormat::from_bytes(b"\x00\x01".as_slice()))?);
//!
//!     let root = Node::with_format("root", container)?;
//!     assert!(root.is_container());
//!     Ok(root)
//! }
//! ```

pub use bytes::Bytes;

mod convert;
mod error;
mod format;
mod node;
mod value;

pub use convert::{
    convert_to, convert_with, erase, Converter, ConverterResolver, Erased, ErasedConverter,
};
pub use error::{ConvertError, Error, Result};
pub use format::{BinaryFormat, ContainerFormat, Format, FormatKind, FormatPayload};
pub use node::Node;
pub use value::Value;

// Re-export stream types for convenience
pub use formfs_stream::{MemoryStream, SeekFrom, Stream, StreamError};
