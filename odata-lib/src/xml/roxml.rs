//! roxmltree-backed read engine

use roxmltree::Document;
use roxmltree::Node;
use roxmltree::NodeId;

use super::NS_ATOM;
use super::NS_DATA;
use super::NS_METADATA;
use super::NS_TOMBSTONES;
use super::XmlDocument;
use super::XmlRead;
use crate::error::ParseError;

/// The namespace prefixes registered for Atom response queries.
pub const ATOM_NAMESPACES: &[(&str, &str)] = &[
    ("default", NS_ATOM),
    ("d", NS_DATA),
    ("m", NS_METADATA),
    ("at", NS_TOMBSTONES),
];

/// The default read engine, parsing with `roxmltree`.
#[derive(Debug, Clone)]
pub struct RoXml {
    namespaces: Vec<(String, String)>,
}

impl RoXml {
    /// Creates an engine with the Atom/OData prefixes registered.
    pub fn new() -> Self {
        Self::with_namespaces(ATOM_NAMESPACES)
    }

    /// Creates an engine with a custom prefix table.
    pub fn with_namespaces(namespaces: &[(&str, &str)]) -> Self {
        Self {
            namespaces: namespaces
                .iter()
                .map(|(prefix, uri)| ((*prefix).to_string(), (*uri).to_string()))
                .collect(),
        }
    }
}

impl Default for RoXml {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlRead for RoXml {
    type Document<'input> = RoDocument<'input>;

    fn parse<'input>(&self, xml: &'input str) -> Result<RoDocument<'input>, ParseError> {
        let doc = Document::parse(xml).map_err(|e| ParseError::malformed(e.to_string()))?;
        Ok(RoDocument {
            doc,
            namespaces: self.namespaces.clone(),
        })
    }
}

/// A parsed document handed out by [`RoXml`].
pub struct RoDocument<'input> {
    doc: Document<'input>,
    namespaces: Vec<(String, String)>,
}

impl RoDocument<'_> {
    fn resolve(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn segment_matches(&self, node: Node<'_, '_>, segment: &str) -> bool {
        if !node.is_element() {
            return false;
        }
        let tag = node.tag_name();
        match segment.split_once(':') {
            Some((prefix, local)) => {
                let Some(uri) = self.resolve(prefix) else {
                    return false;
                };
                tag.namespace() == Some(uri) && (local == "*" || tag.name() == local)
            }
            None => tag.namespace().is_none() && (segment == "*" || tag.name() == segment),
        }
    }
}

impl XmlDocument for RoDocument<'_> {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.doc.root_element().id()
    }

    fn find(&self, node: NodeId, query: &str) -> Vec<NodeId> {
        let (anchored, path) = match query.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, query),
        };
        let mut segments = path.split('/');
        let mut current: Vec<Node<'_, '_>> = if anchored {
            let Some(first) = segments.next() else {
                return Vec::new();
            };
            let root = self.doc.root_element();
            if self.segment_matches(root, first) {
                vec![root]
            } else {
                Vec::new()
            }
        } else {
            match self.doc.get_node(node) {
                Some(n) => vec![n],
                None => return Vec::new(),
            }
        };
        for segment in segments {
            let mut next = Vec::new();
            for n in &current {
                for child in n.children() {
                    if self.segment_matches(child, segment) {
                        next.push(child);
                    }
                }
            }
            current = next;
        }
        current.into_iter().map(|n| n.id()).collect()
    }

    fn name(&self, node: NodeId) -> &str {
        self.doc
            .get_node(node)
            .map(|n| n.tag_name().name())
            .unwrap_or("")
    }

    fn text(&self, node: NodeId) -> String {
        let Some(n) = self.doc.get_node(node) else {
            return String::new();
        };
        let mut out = String::new();
        for child in n.children() {
            if child.is_text() {
                out.push_str(child.text().unwrap_or(""));
            }
        }
        out
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.doc.get_node(node).and_then(|n| n.attribute(name))
    }
}
