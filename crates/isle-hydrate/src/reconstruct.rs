//! DOM to component-tree decoding.
//!
//! Before mounting, the runtime rebuilds the tree shape the island's mount
//! routine expects from the markup the server already rendered. The decoder
//! walks the container's children into an arena of [`VNode`]s:
//!
//! - several DOM children become [`VChildren::Many`], in order
//! - a single child becomes [`VChildren::Single`]
//! - nested island elements are recognized by tag prefix and their props
//!   payload is decoded again; a payload that fails to decode degrades that
//!   element to a plain [`VNode::Element`] and leaves the enclosing island
//!   intact
//! - `<script>` elements are left out of the tree and reported so the
//!   runtime can re-attach them after the container is cleared

use isle_render::{decode_props, ResolvedProps};
use tracing::warn;

use crate::dom::{Dom, DomData, NodeId};
use crate::error::HydrationError;

/// Index of a node in a [`VTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VNodeId(pub usize);

/// Children of a reconstructed node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VChildren {
    #[default]
    None,
    Single(VNodeId),
    Many(Vec<VNodeId>),
}

impl VChildren {
    fn from_ids(mut ids: Vec<VNodeId>) -> Self {
        match ids.len() {
            0 => Self::None,
            1 => Self::Single(ids.remove(0)),
            _ => Self::Many(ids),
        }
    }

    /// Children as a slice-like list.
    pub fn to_vec(&self) -> Vec<VNodeId> {
        match self {
            Self::None => Vec::new(),
            Self::Single(id) => vec![*id],
            Self::Many(ids) => ids.clone(),
        }
    }
}

/// A reconstructed node.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: VChildren,
    },
    Island {
        tag: String,
        props: ResolvedProps,
        children: VChildren,
    },
    Text(String),
}

/// Arena of reconstructed nodes rooted at the island itself.
#[derive(Debug, Clone)]
pub struct VTree {
    nodes: Vec<VNode>,
    root: VNodeId,
    /// Script elements excluded from the tree, in document order.
    pub scripts: Vec<NodeId>,
}

impl VTree {
    pub fn root(&self) -> VNodeId {
        self.root
    }

    pub fn get(&self, id: VNodeId) -> Option<&VNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Props of the root island.
    pub fn props(&self) -> Option<&ResolvedProps> {
        match self.get(self.root)? {
            VNode::Island { props, .. } => Some(props),
            _ => None,
        }
    }

    /// Children of a node.
    pub fn children(&self, id: VNodeId) -> Vec<VNodeId> {
        match self.get(id) {
            Some(VNode::Element { children, .. }) | Some(VNode::Island { children, .. }) => {
                children.to_vec()
            }
            _ => Vec::new(),
        }
    }
}

/// Decoder settings.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Tag prefix of island elements (`island` for `<island-...>`).
    pub tag_prefix: String,
    pub props_attribute: String,
}

impl DecodeOptions {
    pub fn is_island_tag(&self, tag: &str) -> bool {
        tag.strip_prefix(self.tag_prefix.as_str())
            .is_some_and(|rest| rest.len() > 1 && rest.starts_with('-'))
    }
}

/// Rebuild the tree of an island container with already-decoded props.
pub fn reconstruct(
    dom: &Dom,
    container: NodeId,
    props: ResolvedProps,
    options: &DecodeOptions,
) -> Result<VTree, HydrationError> {
    let tag = dom
        .tag(container)
        .ok_or_else(|| HydrationError::UnknownElement(container.to_string()))?
        .to_string();

    let mut decoder = Decoder {
        dom,
        options,
        nodes: Vec::new(),
        scripts: Vec::new(),
    };
    let children = decoder.decode_children(container)?;
    decoder.nodes.push(VNode::Island {
        tag,
        props,
        children,
    });

    Ok(VTree {
        root: VNodeId(decoder.nodes.len() - 1),
        nodes: decoder.nodes,
        scripts: decoder.scripts,
    })
}

struct Decoder<'a> {
    dom: &'a Dom,
    options: &'a DecodeOptions,
    nodes: Vec<VNode>,
    scripts: Vec<NodeId>,
}

impl Decoder<'_> {
    fn decode_children(&mut self, parent: NodeId) -> Result<VChildren, HydrationError> {
        let dom = self.dom;
        let mut ids = Vec::new();
        for child in dom.children(parent) {
            if let Some(id) = self.decode(*child)? {
                ids.push(id);
            }
        }
        Ok(VChildren::from_ids(ids))
    }

    fn decode(&mut self, id: NodeId) -> Result<Option<VNodeId>, HydrationError> {
        let dom = self.dom;
        let Some(node) = dom.node(id) else {
            return Ok(None);
        };

        let vnode = match &node.data {
            DomData::Text(text) if text.trim().is_empty() => return Ok(None),
            DomData::Text(text) => VNode::Text(text.clone()),
            DomData::Comment(_) | DomData::Document => return Ok(None),
            DomData::Element { tag, .. } if tag == "script" => {
                self.scripts.push(id);
                return Ok(None);
            }
            DomData::Element { tag, attrs } if self.options.is_island_tag(tag) => {
                let payload = dom.attr(id, &self.options.props_attribute).unwrap_or("");
                match decode_props(payload) {
                    Ok(props) => VNode::Island {
                        tag: tag.clone(),
                        props,
                        children: self.decode_children(id)?,
                    },
                    Err(error) => {
                        warn!(tag = %tag, %error, "Nested island props failed to decode, keeping markup");
                        VNode::Element {
                            tag: tag.clone(),
                            attrs: attrs.clone(),
                            children: self.decode_children(id)?,
                        }
                    }
                }
            }
            DomData::Element { tag, attrs } => VNode::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: self.decode_children(id)?,
            },
        };

        self.nodes.push(vnode);
        Ok(Some(VNodeId(self.nodes.len() - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> DecodeOptions {
        DecodeOptions {
            tag_prefix: "island".into(),
            props_attribute: "data-props".into(),
        }
    }

    fn container(dom: &Dom) -> NodeId {
        dom.find_elements(|tag| tag == "island-list-1")[0]
    }

    #[test]
    fn test_many_children_positional() {
        let dom = Dom::parse("<island-list-1><li>a</li><li>b</li><li>c</li></island-list-1>").unwrap();
        let tree = reconstruct(&dom, container(&dom), ResolvedProps::new(), &options()).unwrap();

        let children = tree.children(tree.root());
        assert_eq!(children.len(), 3);
        let texts: Vec<_> = children
            .iter()
            .map(|c| match tree.get(tree.children(*c)[0]) {
                Some(VNode::Text(t)) => t.clone(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_single_child() {
        let dom = Dom::parse("<island-list-1><button>1</button></island-list-1>").unwrap();
        let tree = reconstruct(&dom, container(&dom), ResolvedProps::new(), &options()).unwrap();

        match tree.get(tree.root()) {
            Some(VNode::Island { children: VChildren::Single(id), .. }) => {
                assert!(matches!(tree.get(*id), Some(VNode::Element { tag, .. }) if tag == "button"));
            }
            other => panic!("unexpected root {:?}", other),
        }
    }

    #[test]
    fn test_nested_island_props_redecoded() {
        let dom = Dom::parse(
            r#"<island-list-1><island-counter-2 data-props="{&quot;count&quot;:5}"><b>5</b></island-counter-2></island-list-1>"#,
        )
        .unwrap();
        let tree = reconstruct(&dom, container(&dom), ResolvedProps::new(), &options()).unwrap();

        let nested = tree.children(tree.root())[0];
        match tree.get(nested) {
            Some(VNode::Island { tag, props, .. }) => {
                assert_eq!(tag, "island-counter-2");
                assert_eq!(props["count"], json!(5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scripts_excluded_and_reported() {
        let dom = Dom::parse(
            r#"<island-list-1><p>x</p><script src="/a.js"></script><script>init()</script></island-list-1>"#,
        )
        .unwrap();
        let tree = reconstruct(&dom, container(&dom), ResolvedProps::new(), &options()).unwrap();

        assert!(matches!(
            tree.get(tree.root()),
            Some(VNode::Island { children: VChildren::Single(_), .. })
        ));
        assert_eq!(tree.scripts.len(), 2);
        assert_eq!(dom.attr(tree.scripts[0], "src"), Some("/a.js"));
    }

    #[test]
    fn test_whitespace_and_comments_skipped() {
        let dom = Dom::parse("<island-list-1>\n  <!-- c -->\n  <p>x</p>\n</island-list-1>").unwrap();
        let tree = reconstruct(&dom, container(&dom), ResolvedProps::new(), &options()).unwrap();
        assert_eq!(tree.children(tree.root()).len(), 1);
    }

    #[test]
    fn test_nested_decode_failure_keeps_markup() {
        let dom = Dom::parse(
            r#"<island-list-1><island-counter-2 data-props="{oops"><b>5</b></island-counter-2></island-list-1>"#,
        )
        .unwrap();
        let tree = reconstruct(&dom, container(&dom), ResolvedProps::new(), &options()).unwrap();

        let nested = tree.children(tree.root())[0];
        match tree.get(nested) {
            Some(VNode::Element { tag, attrs, children }) => {
                assert_eq!(tag, "island-counter-2");
                assert!(attrs.iter().any(|(k, v)| k == "data-props" && v == "{oops"));
                assert!(matches!(children, VChildren::Single(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_root_props_kept() {
        let dom = Dom::parse("<island-list-1></island-list-1>").unwrap();
        let mut props = ResolvedProps::new();
        props.insert("items".into(), json!([1, 2]));
        let tree = reconstruct(&dom, container(&dom), props, &options()).unwrap();
        assert_eq!(tree.props().unwrap()["items"], json!([1, 2]));
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn test_island_tag_detection() {
        let options = options();
        assert!(options.is_island_tag("island-counter-1"));
        assert!(!options.is_island_tag("island"));
        assert!(!options.is_island_tag("island-"));
        assert!(!options.is_island_tag("islands-x"));
    }
}
