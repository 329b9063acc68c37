/*
 * tree.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Arena-backed document tree.
//!
//! All nodes live in one `Vec` owned by the [`Document`]; a [`NodeId`] is an
//! index into it. Children are stored in source order and each node keeps a
//! non-owning index of its parent.
//!
//! ```rust
//! use xmq::{Document, QName};
//!
//! let mut doc = Document::new();
//! let config = doc.append_element(doc.root(), QName::local("config"));
//! let speed = doc.append_element(config, QName::local("speed"));
//! doc.append_text(speed, "123");
//!
//! assert_eq!(doc.root_element(), Some(config));
//! assert_eq!(doc.text_content(speed), "123");
//! assert_eq!(doc.parent(speed), Some(config));
//! ```

use std::fmt;

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A possibly prefixed name such as `svg:rect`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    pub fn prefixed(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Split `name` at its last colon.
    pub fn parse(name: &str) -> Self {
        match name.rsplit_once(':') {
            Some((ns, local)) => Self::prefixed(ns, local),
            None => Self::local(name),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}:{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An attribute; bare keys such as `(hidden)` have no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: QName,
    pub value: Option<String>,
}

/// A namespace binding declared on an element. A missing prefix is the
/// default namespace (`xmlns = uri`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: Option<String>,
}

/// The kind of a node and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node; there is exactly one, at [`Document::root`].
    Document,
    Element {
        name: QName,
        attributes: Vec<Attribute>,
        namespaces: Vec<NamespaceDecl>,
    },
    Text(String),
    Comment(String),
    /// A named entity that was not decoded, stored without `&` and `;`.
    Entity(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
    DocType(String),
}

/// A node with its links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The first element child of the document node.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    pub fn element_name(&self, id: NodeId) -> Option<&QName> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn namespaces(&self, id: NodeId) -> &[NamespaceDecl] {
        match self.kind(id) {
            NodeKind::Element { namespaces, .. } => namespaces,
            _ => &[],
        }
    }

    /// Value of the attribute whose qualified name prints as `name`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| attr.name.to_string() == name)
            .and_then(|attr| attr.value.as_deref())
    }

    /// Element children with the given local name.
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        local: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.element_name(child).is_some_and(|n| n.local == local))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let NodeKind::Text(text) = self.kind(current) {
                out.push_str(text);
            }
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Allocate a detached node.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn append_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.create_node(kind);
        self.append_child(parent, id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, name: QName) -> NodeId {
        self.append_node(
            parent,
            NodeKind::Element {
                name,
                attributes: Vec::new(),
                namespaces: Vec::new(),
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append_node(parent, NodeKind::Text(text.into()))
    }

    /// Add an attribute to an element. Ignored for other node kinds.
    pub fn push_attribute(&mut self, id: NodeId, attribute: Attribute) {
        if let NodeKind::Element { attributes, .. } = self.kind_mut(id) {
            attributes.push(attribute);
        }
    }

    /// Add a namespace declaration to an element. Ignored for other node kinds.
    pub fn push_namespace(&mut self, id: NodeId, decl: NamespaceDecl) {
        if let NodeKind::Element { namespaces, .. } = self.kind_mut(id) {
            namespaces.push(decl);
        }
    }

    /// Compare the subtree at `a` with the subtree at `b` in `other`,
    /// ignoring node ids.
    pub fn subtree_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((x, y)) = stack.pop() {
            if self.kind(x) != other.kind(y) {
                return false;
            }
            let xs = self.children(x);
            let ys = other.children(y);
            if xs.len() != ys.len() {
                return false;
            }
            stack.extend(xs.iter().copied().zip(ys.iter().copied()));
        }
        true
    }

    /// Structural equality of two whole documents.
    pub fn same_shape(&self, other: &Document) -> bool {
        self.subtree_eq(self.root(), other, other.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        doc.append_node(root, NodeKind::Comment("top".into()));
        let car = doc.append_element(root, QName::local("car"));
        doc.push_attribute(
            car,
            Attribute {
                name: QName::prefixed("x", "id"),
                value: Some("7".into()),
            },
        );
        let wheels = doc.append_element(car, QName::local("wheels"));
        doc.append_text(wheels, "4");
        doc
    }

    #[test]
    fn test_navigation() {
        let doc = sample();
        let car = doc.root_element().unwrap();
        assert_eq!(doc.element_name(car), Some(&QName::local("car")));
        assert_eq!(doc.children(doc.root()).len(), 2);
        let wheels = doc.child_elements(car, "wheels").next().unwrap();
        assert_eq!(doc.parent(wheels), Some(car));
        assert_eq!(doc.text_content(car), "4");
        assert_eq!(doc.attribute(car, "x:id"), Some("7"));
        assert_eq!(doc.attribute(car, "id"), None);
    }

    #[test]
    fn test_qname_parse_and_display() {
        assert_eq!(QName::parse("a:b:c"), QName::prefixed("a:b", "c"));
        assert_eq!(QName::parse("plain").to_string(), "plain");
        assert_eq!(QName::parse("p:").local, "");
    }

    #[test]
    fn test_structural_equality_ignores_ids() {
        let a = sample();
        let mut b = Document::new();
        // Allocate an unrelated detached node first so the ids differ.
        b.create_node(NodeKind::Text("detached".into()));
        let root = b.root();
        b.append_node(root, NodeKind::Comment("top".into()));
        let car = b.append_element(root, QName::local("car"));
        b.push_attribute(
            car,
            Attribute {
                name: QName::prefixed("x", "id"),
                value: Some("7".into()),
            },
        );
        let wheels = b.append_element(car, QName::local("wheels"));
        b.append_text(wheels, "4");
        assert!(a.same_shape(&b));

        b.append_text(wheels, "more");
        assert!(!a.same_shape(&b));
    }

    #[test]
    fn test_document_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
    }
}
