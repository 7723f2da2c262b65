//! Write-side XML capability

/// Capability to build an XML document and serialize it.
///
/// Nodes are opaque `Copy` handles owned by the engine. The entry writer
/// depends only on this trait.
pub trait XmlWrite {
    /// Handle to an element owned by the engine.
    type Node: Copy;

    /// Creates a document root element in the given namespace.
    fn create_element_ns(&mut self, namespace: &str, name: &str) -> Self::Node;

    /// Sets a plain attribute on an element.
    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    /// Sets a namespaced attribute on an element.
    ///
    /// `qualified_name` carries the prefix (e.g. `m:type`); the engine is
    /// responsible for declaring the prefix if no ancestor does.
    fn set_attribute_ns(
        &mut self,
        node: Self::Node,
        namespace: &str,
        qualified_name: &str,
        value: &str,
    );

    /// Appends a child element, optionally in a namespace, and returns it.
    fn append_child(&mut self, parent: Self::Node, name: &str, namespace: Option<&str>)
    -> Self::Node;

    /// Sets the text content of an element.
    fn set_text(&mut self, node: Self::Node, value: &str);

    /// Serializes the subtree rooted at `node` to a string.
    ///
    /// Serializing a document root includes the XML declaration.
    fn to_xml(&self, node: Self::Node) -> String;
}
