//! Nodes: tree units owning a swappable format.
//!
//! A node owns its name, at most one [`Format`], and its children directly.
//! Ownership is exclusive by construction - children and formats move in and
//! out of a node, never alias it. Format replacement keeps the tree
//! invariant: container children are detached before the previous format is
//! released, and a new container's children attach only after it is
//! installed.

use formfs_stream::Stream;

use crate::convert::{self, Converter, ConverterResolver};
use crate::error::{Error, Result};
use crate::format::{Format, FormatKind, FormatPayload};

/// A tree unit with an associated format.
///
/// Mutating operations fail with [`Error::Disposed`] after
/// [`dispose`](Node::dispose); read-only projections keep working.
/// Dropping a node disposes it, so resources release on every exit path.
#[derive(Debug)]
pub struct Node {
    name: String,
    format: Option<Format>,
    children: Vec<Node>,
    disposed: bool,
}

impl Node {
    /// Create a node with no format.
    ///
    /// Names are path segments: empty names and names containing `/` are
    /// rejected with [`Error::InvalidName`].
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            return Err(Error::InvalidName { name });
        }
        Ok(Self {
            name,
            format: None,
            children: Vec::new(),
            disposed: false,
        })
    }

    /// Create a node and install an initial format.
    pub fn with_format(name: impl Into<String>, format: impl Into<Format>) -> Result<Self> {
        let mut node = Self::new(name)?;
        node.set_format(format)?;
        Ok(node)
    }

    /// The node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current format, if any.
    pub fn format(&self) -> Option<&Format> {
        self.format.as_ref()
    }

    /// The current format, mutably.
    pub fn format_mut(&mut self) -> Option<&mut Format> {
        self.format.as_mut()
    }

    /// Typed view of the current format's payload.
    ///
    /// Returns `None` if no format is set or the payload type does not
    /// match.
    pub fn format_as<T: FormatPayload>(&self) -> Result<Option<&T>> {
        self.check_live()?;
        Ok(self.format.as_ref().and_then(T::as_payload))
    }

    /// Whether the current format is a container of child nodes.
    pub fn is_container(&self) -> bool {
        self.format.as_ref().is_some_and(Format::is_container)
    }

    /// The underlying stream, present only when the current format is
    /// binary-backed.
    ///
    /// This is a read-only projection; it says nothing about disposal state.
    pub fn stream(&self) -> Option<&dyn Stream> {
        match self.format.as_ref() {
            Some(Format::Binary(binary)) => Some(binary.stream()),
            _ => None,
        }
    }

    /// The node's children.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Look up a direct child by name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Add a child, replacing an existing child of the same name.
    pub fn add_child(&mut self, node: Node) {
        match self.children.iter().position(|c| c.name == node.name) {
            Some(index) => self.children[index] = node,
            None => self.children.push(node),
        }
    }

    /// Detach and return all children.
    pub fn remove_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Walk `/`-separated segments down the tree.
    pub fn descendant(&self, path: &str) -> Option<&Node> {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Replace the current format, disposing the previous one.
    ///
    /// If the previous format was a container, its children leave the tree
    /// first; if the new format is a container, its children attach after
    /// installation and the container is left empty.
    pub fn set_format(&mut self, format: impl Into<Format>) -> Result<()> {
        self.install_format(format.into(), true)?;
        Ok(())
    }

    /// Replace the current format and hand the previous one back
    /// un-disposed.
    ///
    /// The same sequencing as [`set_format`](Node::set_format) applies: a
    /// returned container format is empty, because its children were
    /// detached when it left the format slot - they cannot have two owners.
    pub fn replace_format(&mut self, format: impl Into<Format>) -> Result<Option<Format>> {
        self.install_format(format.into(), false)
    }

    /// The one format-mutation path. Ordering is load-bearing:
    /// detach children, release the previous format, install, attach.
    fn install_format(&mut self, new: Format, dispose_previous: bool) -> Result<Option<Format>> {
        self.check_live()?;

        // Children attributed to a container format leave the tree before
        // any resource release, so nothing reachable through the tree points
        // at a released resource.
        if self.is_container() {
            self.children.clear();
        }

        let mut previous = self.format.take();
        if dispose_previous {
            if let Some(prev) = previous.as_mut() {
                prev.dispose();
            }
            previous = None;
        }

        self.format = Some(new);

        if let Some(Format::Container(container)) = self.format.as_mut() {
            // Replaces any children added since the last format change; a
            // container's children belong to exactly one node.
            self.children = container.take_children();
        }

        Ok(previous)
    }

    /// Transform to a destination kind through converter discovery.
    ///
    /// On success the result is installed through the
    /// [`set_format`](Node::set_format) path, disposing the previous
    /// format. On failure the node is untouched.
    pub fn transform_to(
        &mut self,
        dest: FormatKind,
        resolver: &dyn ConverterResolver,
    ) -> Result<&mut Self> {
        self.check_live()?;
        let format = self.format.as_ref().ok_or(Error::MissingFormat)?;
        let converted = convert::convert_to(dest, format, resolver)?;
        self.set_format(converted)?;
        Ok(self)
    }

    /// Transform with a converter constructed from its type.
    ///
    /// The converter/source/destination pair is checked at compile time.
    pub fn transform<C, S, D>(&mut self) -> Result<&mut Self>
    where
        S: FormatPayload,
        D: FormatPayload,
        C: Converter<S, D> + Default,
    {
        self.transform_with(&C::default())
    }

    /// Transform with an explicit converter instance.
    pub fn transform_with<S, D>(&mut self, converter: &impl Converter<S, D>) -> Result<&mut Self>
    where
        S: FormatPayload,
        D: FormatPayload,
    {
        self.check_live()?;
        let format = self.format.as_ref().ok_or(Error::MissingFormat)?;
        let converted = convert::convert_with(converter, format)?;
        self.set_format(converted)?;
        Ok(self)
    }

    /// Release the current format and all children, and invalidate the node.
    ///
    /// Idempotent: a second call is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(format) = self.format.as_mut() {
            format.dispose();
        }
        for child in &mut self.children {
            child.dispose();
        }
    }

    /// Whether `dispose` has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn check_live(&self) -> Result<()> {
        if self.disposed {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::convert::{erase, ErasedConverter};
    use crate::error::ConvertError;
    use crate::format::{BinaryFormat, ContainerFormat};
    use crate::value::Value;

    /// Decodes binary bytes as a UTF-8 string value.
    #[derive(Default)]
    struct TextReader;

    impl Converter<BinaryFormat, Value> for TextReader {
        fn convert(&self, source: &BinaryFormat) -> std::result::Result<Value, ConvertError> {
            let bytes = source.stream().snapshot().map_err(ConvertError::failed)?;
            let text = std::str::from_utf8(&bytes).map_err(ConvertError::failed)?;
            Ok(Value::String(text.to_string()))
        }
    }

    /// Encodes a string value back to bytes.
    #[derive(Default)]
    struct TextWriter;

    impl Converter<Value, BinaryFormat> for TextWriter {
        fn convert(&self, source: &Value) -> std::result::Result<BinaryFormat, ConvertError> {
            let text = source
                .as_str()
                .ok_or_else(|| ConvertError::failed("not a string value"))?;
            Ok(BinaryFormat::from_bytes(text.as_bytes().to_vec()))
        }
    }

    /// Always fails.
    struct BrokenConverter;

    impl Converter<Value, BinaryFormat> for BrokenConverter {
        fn convert(&self, _source: &Value) -> std::result::Result<BinaryFormat, ConvertError> {
            Err(ConvertError::failed("broken on purpose"))
        }
    }

    /// Resolver over a fixed set of converters.
    struct TestResolver {
        converters: Vec<Arc<dyn ErasedConverter>>,
    }

    impl TestResolver {
        fn with(converters: Vec<Arc<dyn ErasedConverter>>) -> Self {
            Self { converters }
        }
    }

    impl ConverterResolver for TestResolver {
        fn resolve(
            &self,
            source: FormatKind,
            dest: FormatKind,
        ) -> Option<Arc<dyn ErasedConverter>> {
            self.converters
                .iter()
                .find(|c| c.source_kind() == source && c.dest_kind() == dest)
                .map(Arc::clone)
        }
    }

    fn container_with(names: &[&str]) -> ContainerFormat {
        let mut container = ContainerFormat::new();
        for name in names {
            container.add(Node::new(*name).unwrap());
        }
        container
    }

    #[test]
    fn new_node_has_no_format() {
        let node = Node::new("empty").unwrap();
        assert!(node.format().is_none());
        assert!(!node.is_container());
        assert!(node.stream().is_none());
        assert!(node.children().is_empty());
    }

    #[test]
    fn empty_name_rejected() {
        assert!(matches!(Node::new(""), Err(Error::InvalidName { .. })));
    }

    #[test]
    fn separator_in_name_rejected() {
        let err = Node::new("a/b").unwrap_err();
        assert!(matches!(err, Error::InvalidName { name } if name == "a/b"));
    }

    #[test]
    fn container_format_expands_into_children() {
        let root = Node::with_format("root", container_with(&["a", "b"])).unwrap();

        assert!(root.is_container());
        assert_eq!(root.children().len(), 2);
        assert!(root.child("a").is_some());
        assert!(root.child("b").is_some());

        // Transfer, not duplication: the installed container is empty.
        let held = root.format_as::<ContainerFormat>().unwrap().unwrap();
        assert!(held.is_empty());
    }

    #[test]
    fn leaf_format_collapses_children() {
        let mut root = Node::with_format("root", container_with(&["a", "b"])).unwrap();

        root.set_format(BinaryFormat::from_bytes(b"raw".as_slice()))
            .unwrap();

        assert!(!root.is_container());
        assert!(root.children().is_empty());
        assert!(root.stream().is_some());
    }

    #[test]
    fn displaced_container_comes_back_empty() {
        let mut root = Node::with_format("root", container_with(&["a", "b"])).unwrap();

        let previous = root.replace_format(Value::Null).unwrap().unwrap();
        match previous {
            Format::Container(container) => assert!(container.is_empty()),
            other => panic!("expected container, got {:?}", other),
        }
        assert!(root.children().is_empty());
    }

    #[test]
    fn container_to_container_reattaches_fully() {
        let mut root = Node::with_format("root", container_with(&["a", "b"])).unwrap();
        root.set_format(container_with(&["c"])).unwrap();

        assert!(root.is_container());
        assert_eq!(root.children().len(), 1);
        assert!(root.child("a").is_none());
        assert!(root.child("c").is_some());
    }

    #[test]
    fn attach_clears_manually_added_children() {
        let mut root = Node::with_format("root", Value::Null).unwrap();
        root.add_child(Node::new("stray").unwrap());

        root.set_format(container_with(&["kept"])).unwrap();

        assert_eq!(root.children().len(), 1);
        assert!(root.child("stray").is_none());
    }

    #[test]
    fn replace_format_hands_back_undisposed_previous() {
        let mut node =
            Node::with_format("leaf", BinaryFormat::from_bytes(b"old".as_slice())).unwrap();

        let old = node.replace_format(Value::Null).unwrap().unwrap();
        match old {
            Format::Binary(binary) => {
                assert!(!binary.is_disposed());
                assert_eq!(&binary.stream().snapshot().unwrap()[..], b"old");
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn stream_projection_only_for_binary() {
        let node = Node::with_format("v", Value::Null).unwrap();
        assert!(node.stream().is_none());

        let node = Node::with_format("c", ContainerFormat::new()).unwrap();
        assert!(node.stream().is_none());

        let node = Node::with_format("b", BinaryFormat::from_bytes(b"x".as_slice())).unwrap();
        assert_eq!(node.stream().unwrap().len(), 1);
    }

    #[test]
    fn add_child_replaces_same_name() {
        let mut root = Node::new("root").unwrap();
        root.add_child(Node::with_format("x", Value::Integer(1)).unwrap());
        root.add_child(Node::with_format("x", Value::Integer(2)).unwrap());

        assert_eq!(root.children().len(), 1);
        let x = root.child("x").unwrap();
        assert_eq!(
            x.format().unwrap().as_payload::<Value>(),
            Some(&Value::Integer(2))
        );
    }

    #[test]
    fn descendant_walks_segments() {
        let inner = container_with(&["file"]);
        let mut outer = ContainerFormat::new();
        outer.add(Node::with_format("dir", inner).unwrap());
        let root = Node::with_format("root", outer).unwrap();

        assert_eq!(root.descendant("dir/file").unwrap().name(), "file");
        assert_eq!(root.descendant("dir").unwrap().name(), "dir");
        assert!(root.descendant("dir/missing").is_none());
        assert_eq!(root.descendant("").unwrap().name(), "root");
    }

    #[test]
    fn transform_without_format_fails_and_leaves_none() {
        let mut node = Node::new("bare").unwrap();

        let err = node.transform_with(&TextReader).unwrap_err();
        assert!(matches!(err, Error::MissingFormat));
        assert!(node.format().is_none());

        let resolver = TestResolver::with(vec![erase(TextReader)]);
        let err = node.transform_to(FormatKind::Value, &resolver).unwrap_err();
        assert!(matches!(err, Error::MissingFormat));
        assert!(node.format().is_none());
    }

    #[test]
    fn transform_with_explicit_instance() {
        let mut node =
            Node::with_format("leaf", BinaryFormat::from_bytes(b"hola".as_slice())).unwrap();

        node.transform_with(&TextReader).unwrap();

        assert_eq!(
            node.format_as::<Value>().unwrap(),
            Some(&Value::String("hola".to_string()))
        );
    }

    #[test]
    fn transform_by_converter_type() {
        let mut node =
            Node::with_format("leaf", BinaryFormat::from_bytes(b"typed".as_slice())).unwrap();

        node.transform::<TextReader, BinaryFormat, Value>().unwrap();

        assert_eq!(
            node.format_as::<Value>().unwrap(),
            Some(&Value::String("typed".to_string()))
        );
    }

    #[test]
    fn transform_chains() {
        let mut node =
            Node::with_format("leaf", BinaryFormat::from_bytes(b"ping".as_slice())).unwrap();

        node.transform_with(&TextReader)
            .unwrap()
            .transform_with(&TextWriter)
            .unwrap();

        assert_eq!(&node.stream().unwrap().snapshot().unwrap()[..], b"ping");
    }

    #[test]
    fn discovery_and_explicit_instance_agree() {
        let mut via_resolver =
            Node::with_format("a", BinaryFormat::from_bytes(b"same".as_slice())).unwrap();
        let mut via_instance =
            Node::with_format("b", BinaryFormat::from_bytes(b"same".as_slice())).unwrap();

        let resolver = TestResolver::with(vec![erase(TextReader)]);
        via_resolver
            .transform_to(FormatKind::Value, &resolver)
            .unwrap();
        via_instance.transform_with(&TextReader).unwrap();

        assert_eq!(
            via_resolver.format_as::<Value>().unwrap(),
            via_instance.format_as::<Value>().unwrap()
        );
    }

    #[test]
    fn resolver_miss_surfaces_no_converter() {
        let mut node = Node::with_format("leaf", Value::Null).unwrap();
        let resolver = TestResolver::with(vec![]);

        let err = node.transform_to(FormatKind::Binary, &resolver).unwrap_err();
        assert!(matches!(
            err,
            Error::Conversion(ConvertError::NoConverter { .. })
        ));
    }

    #[test]
    fn failed_transform_leaves_format_untouched() {
        let mut node = Node::with_format("leaf", Value::String("keep me".to_string())).unwrap();

        let err = node.transform_with(&BrokenConverter).unwrap_err();
        assert!(matches!(err, Error::Conversion(ConvertError::Failed { .. })));

        assert_eq!(
            node.format_as::<Value>().unwrap(),
            Some(&Value::String("keep me".to_string()))
        );
    }

    #[test]
    fn mismatched_source_leaves_format_untouched() {
        let mut node = Node::with_format("leaf", Value::Integer(9)).unwrap();

        // TextReader wants a binary source.
        let err = node.transform_with(&TextReader).unwrap_err();
        assert!(matches!(
            err,
            Error::Conversion(ConvertError::SourceMismatch { .. })
        ));
        assert_eq!(node.format_as::<Value>().unwrap(), Some(&Value::Integer(9)));
    }

    #[test]
    fn dispose_invalidates_lifecycle_operations() {
        let mut node =
            Node::with_format("leaf", BinaryFormat::from_bytes(b"bye".as_slice())).unwrap();
        node.dispose();

        assert!(node.is_disposed());
        assert!(matches!(node.set_format(Value::Null), Err(Error::Disposed)));
        assert!(matches!(
            node.replace_format(Value::Null),
            Err(Error::Disposed)
        ));
        assert!(matches!(
            node.transform_with(&TextReader),
            Err(Error::Disposed)
        ));
        assert!(matches!(node.format_as::<Value>(), Err(Error::Disposed)));

        let resolver = TestResolver::with(vec![erase(TextReader)]);
        assert!(matches!(
            node.transform_to(FormatKind::Value, &resolver),
            Err(Error::Disposed)
        ));
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut node = Node::with_format("leaf", Value::Null).unwrap();
        node.dispose();
        node.dispose();
        assert!(node.is_disposed());
    }

    #[test]
    fn dispose_reaches_format_and_children() {
        let mut container = ContainerFormat::new();
        container.add(
            Node::with_format("inner", BinaryFormat::from_bytes(b"z".as_slice())).unwrap(),
        );
        let mut root = Node::with_format("root", container).unwrap();

        root.dispose();

        assert!(root.children()[0].is_disposed());
        match root.format() {
            Some(Format::Container(_)) => {}
            other => panic!("expected container format, got {:?}", other),
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// Serializes any value losslessly into a binary payload.
        #[derive(Default)]
        struct ValuePacker;

        impl Converter<Value, BinaryFormat> for ValuePacker {
            fn convert(&self, source: &Value) -> std::result::Result<BinaryFormat, ConvertError> {
                let bytes = serde_json::to_vec(source).map_err(ConvertError::failed)?;
                Ok(BinaryFormat::from_bytes(bytes))
            }
        }

        /// Inverse of [`ValuePacker`].
        #[derive(Default)]
        struct ValueUnpacker;

        impl Converter<BinaryFormat, Value> for ValueUnpacker {
            fn convert(&self, source: &BinaryFormat) -> std::result::Result<Value, ConvertError> {
                let bytes = source.stream().snapshot().map_err(ConvertError::failed)?;
                serde_json::from_slice(&bytes).map_err(ConvertError::failed)
            }
        }

        // No floats: NaN breaks the equality the property relies on.
        fn value_strategy() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::Integer),
                ".{0,16}".prop_map(Value::String),
                proptest::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
            ]
        }

        proptest! {
            /// Inverse converter pairs restore the original payload.
            #[test]
            fn prop_transform_roundtrip(value in value_strategy()) {
                let mut node = Node::with_format("subject", value.clone()).unwrap();

                node.transform_with(&ValuePacker).unwrap();
                node.transform_with(&ValueUnpacker).unwrap();

                prop_assert_eq!(node.format_as::<Value>().unwrap(), Some(&value));
            }

            /// A failed conversion never mutates the node.
            #[test]
            fn prop_failure_preserves_state(value in value_strategy()) {
                let mut node = Node::with_format("subject", value.clone()).unwrap();

                let _ = node.transform_with(&BrokenConverter);

                prop_assert_eq!(node.format_as::<Value>().unwrap(), Some(&value));
            }
        }
    }
}
