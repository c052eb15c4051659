//! Arena DOM the runtime hydrates against.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]. Detached nodes stay
//! in the arena with no parent, so ids never dangle.

use std::fmt;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::debug;

use crate::error::HydrationError;

/// Index of a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The document node.
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomData {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: DomData,
}

/// An arena-allocated document.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<DomNode>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty document.
    pub fn new() -> Self {
        Self {
            nodes: vec![DomNode {
                parent: None,
                children: Vec::new(),
                data: DomData::Document,
            }],
        }
    }

    /// Parse an HTML document.
    pub fn parse(html: &str) -> Result<Self, HydrationError> {
        let rc = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| HydrationError::Parse(e.to_string()))?;

        let mut dom = Self::new();
        for child in rc.document.children.borrow().iter() {
            dom.import(child, NodeId::ROOT);
        }
        debug!(nodes = dom.len(), "Parsed document");
        Ok(dom)
    }

    fn import(&mut self, handle: &Handle, parent: NodeId) {
        let data = match &handle.data {
            NodeData::Element { name, attrs, .. } => DomData::Element {
                tag: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect(),
            },
            NodeData::Text { contents } => DomData::Text(contents.borrow().to_string()),
            NodeData::Comment { contents } => DomData::Comment(contents.to_string()),
            NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
                return;
            }
        };

        let id = self.push(data);
        self.append_child(parent, id);
        for child in handle.children.borrow().iter() {
            self.import(child, id);
        }
    }

    fn push(&mut self, data: DomData) -> NodeId {
        self.nodes.push(DomNode {
            parent: None,
            children: Vec::new(),
            data,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push(DomData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(DomData::Text(text.to_string()))
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() || parent == child {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` at `index` among the children of `parent`, clamped
    /// to the end.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() || parent == child {
            return;
        }
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Position of a node among its siblings.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Remove a node from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(id.0).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
    }

    /// Detach every child of `id`, returning them in order.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return Vec::new();
        };
        let children = std::mem::take(&mut node.children);
        for child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Whether the node is attached to the document.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == NodeId::ROOT {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Tag name of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.data {
            DomData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id.0)?.data {
            DomData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(DomNode {
            data: DomData::Element { attrs, .. },
            ..
        }) = self.nodes.get_mut(id.0)
        {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some(attr) => attr.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.nodes.get(id.0).map(|n| &n.data) {
            Some(DomData::Text(text)) => out.push_str(text),
            Some(_) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Connected elements in document order matching a predicate.
    pub fn find_elements(&self, mut predicate: impl FnMut(&str) -> bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if let Some(tag) = self.tag(id) {
                if predicate(tag) {
                    found.push(id);
                }
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// Serialize a node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.data {
            DomData::Document => {
                for child in &node.children {
                    self.write_html(*child, out);
                }
            }
            DomData::Text(text) => {
                let raw = node
                    .parent
                    .and_then(|p| self.tag(p))
                    .is_some_and(|t| matches!(t, "script" | "style"));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&isle_render::escape_html(text));
                }
            }
            DomData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            DomData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(r#" {}="{}""#, name, isle_render::escape_attr(value)));
                }
                out.push('>');
                if isle_render::is_void_element(tag) {
                    return;
                }
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}
