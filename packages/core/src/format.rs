//! Format payloads and the typed bridge over them.
//!
//! A [`Format`] is the current interpretation of a node's content. It is a
//! closed tagged variant: a binary-backed leaf, a container of child nodes,
//! or a structured [`Value`]. `is_container` and the stream projection are
//! pattern matches, not casts.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use formfs_stream::{MemoryStream, Stream, StreamError};

use crate::node::Node;
use crate::value::Value;

/// Runtime type token for a format payload.
///
/// This is the descriptor converter dispatch works with: discovery resolves
/// a converter for a `(source, dest)` pair of kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Leaf backed by a byte stream.
    Binary,
    /// Container of child nodes.
    Container,
    /// Structured value payload.
    Value,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Binary => write!(f, "binary"),
            FormatKind::Container => write!(f, "container"),
            FormatKind::Value => write!(f, "value"),
        }
    }
}

/// The current interpretation of a node's content.
///
/// A format may own resources (a binary format owns its stream, a container
/// owns child nodes until they transfer); `dispose` releases them
/// deterministically and is idempotent.
#[derive(Debug)]
pub enum Format {
    /// Unstructured bytes behind a [`Stream`].
    Binary(BinaryFormat),
    /// A set of child nodes to be exposed by the owning node.
    Container(ContainerFormat),
    /// A parsed, structured payload.
    Value(Value),
}

impl Format {
    /// The runtime type token of this payload.
    pub fn kind(&self) -> FormatKind {
        match self {
            Format::Binary(_) => FormatKind::Binary,
            Format::Container(_) => FormatKind::Container,
            Format::Value(_) => FormatKind::Value,
        }
    }

    /// Check if this format is the container variant.
    pub fn is_container(&self) -> bool {
        matches!(self, Format::Container(_))
    }

    /// Typed view of the payload, or `None` if the variant does not match.
    pub fn as_payload<T: FormatPayload>(&self) -> Option<&T> {
        T::as_payload(self)
    }

    /// Release any resources this payload owns. Idempotent.
    pub fn dispose(&mut self) {
        match self {
            Format::Binary(binary) => binary.dispose(),
            Format::Container(container) => container.dispose(),
            Format::Value(_) => {}
        }
    }
}

impl From<BinaryFormat> for Format {
    fn from(binary: BinaryFormat) -> Self {
        Format::Binary(binary)
    }
}

impl From<ContainerFormat> for Format {
    fn from(container: ContainerFormat) -> Self {
        Format::Container(container)
    }
}

impl From<Value> for Format {
    fn from(value: Value) -> Self {
        Format::Value(value)
    }
}

/// A leaf format backed by a byte stream.
///
/// Owns the stream exclusively and forwards disposal to it. The bytes are
/// never interpreted at this layer.
pub struct BinaryFormat {
    stream: Box<dyn Stream>,
}

impl BinaryFormat {
    /// Wrap a stream as a binary format.
    pub fn new(stream: impl Stream + 'static) -> Self {
        Self {
            stream: Box::new(stream),
        }
    }

    /// Create a binary format over an in-memory copy of `data`.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(MemoryStream::from_bytes(data))
    }

    /// The underlying stream.
    pub fn stream(&self) -> &dyn Stream {
        self.stream.as_ref()
    }

    /// The underlying stream, mutably.
    pub fn stream_mut(&mut self) -> &mut dyn Stream {
        self.stream.as_mut()
    }

    /// Take the stream out, consuming the format.
    pub fn into_stream(self) -> Box<dyn Stream> {
        self.stream
    }

    /// Compare the full contents of two binary formats.
    ///
    /// Streams are not `PartialEq`; this snapshots both sides.
    pub fn contents_eq(&self, other: &BinaryFormat) -> Result<bool, StreamError> {
        Ok(self.stream.snapshot()? == other.stream.snapshot()?)
    }

    /// Release the stream. Idempotent.
    pub fn dispose(&mut self) {
        self.stream.dispose();
    }

    /// Whether the stream has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.stream.is_disposed()
    }
}

impl fmt::Debug for BinaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryFormat")
            .field("len", &self.stream.len())
            .field("disposed", &self.stream.is_disposed())
            .finish()
    }
}

/// A format that owns a set of child nodes.
///
/// When a container becomes a node's current format, the children transfer
/// to the node through [`take_children`](ContainerFormat::take_children) and
/// the container is left empty - children belong to exactly one owner at a
/// time.
#[derive(Debug, Default)]
pub struct ContainerFormat {
    children: Vec<Node>,
}

impl ContainerFormat {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child node to the container.
    pub fn add(&mut self, node: Node) {
        self.children.push(node);
    }

    /// The children currently held by the container.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Number of children currently held.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the container currently holds no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Transfer the children out, leaving the container empty.
    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Dispose any children still held. Idempotent.
    pub fn dispose(&mut self) {
        for child in &mut self.children {
            child.dispose();
        }
        self.children.clear();
    }
}

/// Typed bridge between concrete payload types and the [`Format`] variant
/// that carries them.
///
/// This is the static side of converter dispatch: a
/// [`Converter<S, D>`](crate::Converter) is typed over two payloads, and the
/// bridge projects them in and out of the untyped format slot.
pub trait FormatPayload: Sized {
    /// The runtime token for this payload type.
    const KIND: FormatKind;

    /// Wrap the payload in its format variant.
    fn into_format(self) -> Format;

    /// Project the payload out of a format, if the variant matches.
    fn as_payload(format: &Format) -> Option<&Self>;
}

impl FormatPayload for BinaryFormat {
    const KIND: FormatKind = FormatKind::Binary;

    fn into_format(self) -> Format {
        Format::Binary(self)
    }

    fn as_payload(format: &Format) -> Option<&Self> {
        match format {
            Format::Binary(binary) => Some(binary),
            _ => None,
        }
    }
}

impl FormatPayload for ContainerFormat {
    const KIND: FormatKind = FormatKind::Container;

    fn into_format(self) -> Format {
        Format::Container(self)
    }

    fn as_payload(format: &Format) -> Option<&Self> {
        match format {
            Format::Container(container) => Some(container),
            _ => None,
        }
    }
}

impl FormatPayload for Value {
    const KIND: FormatKind = FormatKind::Value;

    fn into_format(self) -> Format {
        Format::Value(self)
    }

    fn as_payload(format: &Format) -> Option<&Self> {
        match format {
            Format::Value(value) => Some(value),
            _ => None,
        }
    }
}
