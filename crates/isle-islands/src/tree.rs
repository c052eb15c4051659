//! Component source tree model.
//!
//! A tree is the statically analyzable shape of a page or component: HTML
//! elements, text, and component call sites with their props and source
//! locations. Trees serialize to JSON so external front-ends can hand them
//! to the extractor.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a call site in its source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A prop value as written at a call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropValue {
    /// A literal JSON value.
    Json(serde_json::Value),
    /// A function reference. Cannot cross the server/client boundary.
    Function(String),
    /// A route parameter, resolved per request.
    Param(String),
    /// A JSON pointer into the page loader's data, resolved per request.
    Data(String),
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Props at a call site, keyed by name.
pub type Props = BTreeMap<String, PropValue>;

/// Where a component's implementation is imported from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRef {
    /// Module path (`src/components/counter.tsx`).
    pub path: String,
    /// Exported binding (`Counter`, or `default`).
    pub export: String,
}

/// A plain HTML element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// A component call site.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentCall {
    /// Component name as referenced at the call site.
    pub name: String,
    /// Import of the implementation, when statically known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportRef>,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Source location, when statically known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl ComponentCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_import(mut self, path: impl Into<String>, export: impl Into<String>) -> Self {
        self.import = Some(ImportRef {
            path: path.into(),
            export: export.into(),
        });
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation::new(file, line, column));
        self
    }
}

/// Server-tree stand-in for an island call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandPlaceholder {
    /// Custom-element tag, unique per call site.
    pub tag: String,
    /// Island id.
    pub island_id: String,
    /// Original component name, used to render the initial markup.
    pub component: String,
    /// Props, passed through unchanged from the call site.
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// A node of a component source tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Element(Element),
    Component(ComponentCall),
    Island(IslandPlaceholder),
    Text { text: String },
    /// Pre-rendered HTML, emitted verbatim.
    Raw { html: String },
    Fragment { children: Vec<Node> },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn raw(html: impl Into<String>) -> Self {
        Self::Raw { html: html.into() }
    }

    pub fn fragment(children: Vec<Node>) -> Self {
        Self::Fragment { children }
    }

    /// Direct children of this node.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Element(el) => &el.children,
            Self::Component(call) => &call.children,
            Self::Island(island) => &island.children,
            Self::Fragment { children } => children,
            Self::Text { .. } | Self::Raw { .. } => &[],
        }
    }

    /// Every island placeholder in the tree, depth-first.
    pub fn islands(&self) -> Vec<&IslandPlaceholder> {
        let mut found = Vec::new();
        self.collect_islands(&mut found);
        found
    }

    fn collect_islands<'a>(&'a self, found: &mut Vec<&'a IslandPlaceholder>) {
        if let Self::Island(island) = self {
            found.push(island);
        }
        for child in self.children() {
            child.collect_islands(found);
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<ComponentCall> for Node {
    fn from(call: ComponentCall) -> Self {
        Self::Component(call)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}
