//! Arena-backed XML write engine

use super::XmlWrite;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Handle to an element in a [`TreeWriter`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode(usize);

#[derive(Debug)]
struct ElementData {
    name: String,
    /// Namespace the element was created in, used to declare an undeclared
    /// prefix at serialization time.
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<usize>,
    text: String,
    document_root: bool,
}

#[derive(Debug)]
struct Attribute {
    name: String,
    value: String,
    namespace: Option<String>,
}

/// The default write engine: an element arena serialized by hand.
///
/// Prefixed names are emitted as given; a prefix whose namespace is known
/// to the engine and not declared by an ancestor `xmlns:` attribute gets a
/// declaration on the element that introduces it.
#[derive(Debug, Default)]
pub struct TreeWriter {
    nodes: Vec<ElementData>,
}

impl TreeWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, namespace: Option<&str>, document_root: bool) -> usize {
        self.nodes.push(ElementData {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
            document_root,
        });
        self.nodes.len() - 1
    }

    fn serialize(&self, id: usize, declared: &mut Vec<String>, out: &mut String) {
        let node = &self.nodes[id];
        let depth_mark = declared.len();

        out.push('<');
        out.push_str(&node.name);

        for attribute in &node.attributes {
            if let Some(prefix) = attribute.name.strip_prefix("xmlns:") {
                declared.push(prefix.to_string());
            }
            out.push(' ');
            out.push_str(&attribute.name);
            out.push_str("=\"");
            out.push_str(&escape_xml(&attribute.value));
            out.push('"');
        }

        // Declare prefixes this element introduces but no ancestor declares.
        let mut pending: Vec<(&str, &str)> = Vec::new();
        if let Some((prefix, _)) = node.name.split_once(':') {
            if let Some(namespace) = &node.namespace {
                pending.push((prefix, namespace));
            }
        }
        for attribute in &node.attributes {
            if let (Some((prefix, _)), Some(namespace)) =
                (attribute.name.split_once(':'), &attribute.namespace)
            {
                pending.push((prefix, namespace));
            }
        }
        for (prefix, namespace) in pending {
            if prefix != "xmlns" && !declared.iter().any(|p| p == prefix) {
                out.push_str(" xmlns:");
                out.push_str(prefix);
                out.push_str("=\"");
                out.push_str(&escape_xml(namespace));
                out.push('"');
                declared.push(prefix.to_string());
            }
        }

        if node.children.is_empty() && node.text.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&escape_text(&node.text));
            for &child in &node.children {
                self.serialize(child, declared, out);
            }
            out.push_str("</");
            out.push_str(&node.name);
            out.push('>');
        }

        declared.truncate(depth_mark);
    }
}

impl XmlWrite for TreeWriter {
    type Node = TreeNode;

    fn create_element_ns(&mut self, namespace: &str, name: &str) -> TreeNode {
        let id = self.push(name, Some(namespace), true);
        self.nodes[id].attributes.push(Attribute {
            name: "xmlns".to_string(),
            value: namespace.to_string(),
            namespace: None,
        });
        TreeNode(id)
    }

    fn set_attribute(&mut self, node: TreeNode, name: &str, value: &str) {
        self.nodes[node.0].attributes.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
            namespace: None,
        });
    }

    fn set_attribute_ns(&mut self, node: TreeNode, namespace: &str, qualified_name: &str, value: &str) {
        self.nodes[node.0].attributes.push(Attribute {
            name: qualified_name.to_string(),
            value: value.to_string(),
            namespace: Some(namespace.to_string()),
        });
    }

    fn append_child(&mut self, parent: TreeNode, name: &str, namespace: Option<&str>) -> TreeNode {
        let id = self.push(name, namespace, false);
        self.nodes[parent.0].children.push(id);
        TreeNode(id)
    }

    fn set_text(&mut self, node: TreeNode, value: &str) {
        self.nodes[node.0].text = value.to_string();
    }

    fn to_xml(&self, node: TreeNode) -> String {
        let mut out = String::new();
        if self.nodes[node.0].document_root {
            out.push_str(XML_DECLARATION);
            out.push('\n');
        }
        self.serialize(node.0, &mut Vec::new(), &mut out);
        out
    }
}

/// Escapes a string for use in XML attribute values.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Escapes a string for use in XML text content; quotes stay literal.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
