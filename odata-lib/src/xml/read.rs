//! Read-side XML capability

use crate::error::ParseError;

/// Capability to parse XML into a navigable document.
///
/// The feed reader depends only on this trait; the parsed document borrows
/// the input buffer for the duration of one parse call.
pub trait XmlRead {
    /// The parsed document type for a given input lifetime.
    type Document<'input>: XmlDocument;

    /// Parses an XML string, with the engine's namespace prefixes registered
    /// for subsequent path queries.
    fn parse<'input>(&self, xml: &'input str) -> Result<Self::Document<'input>, ParseError>;
}

/// A parsed document supporting namespace-aware path queries.
///
/// Queries are `/`-separated segments of `prefix:name` or `prefix:*`,
/// resolved against the prefixes registered by the engine. A leading `/`
/// anchors the first segment at the document root; otherwise segments
/// descend from the given node's children.
pub trait XmlDocument {
    /// Handle to an element in the document.
    type Node: Copy;

    /// Returns the document root element.
    fn root(&self) -> Self::Node;

    /// Runs a path query relative to `node` and returns matches in
    /// document order.
    fn find(&self, node: Self::Node, query: &str) -> Vec<Self::Node>;

    /// Returns the element's local name.
    fn name(&self, node: Self::Node) -> &str;

    /// Returns the element's direct text content.
    fn text(&self, node: Self::Node) -> String;

    /// Returns an attribute value, if present.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;
}
