//! Island extraction.
//!
//! Walks a component source tree, lifts every island call site into its own
//! client unit, and rewrites the server tree to reference a placeholder
//! element in its place.

use std::collections::BTreeMap;

use isle_core::IslandsConfig;
use serde::Serialize;
use tracing::debug;

use crate::classify::{IslandClassifier, NameSuffix};
use crate::codegen::{is_js_identifier, ClientCodegen, ClientUnit};
use crate::error::{ExtractError, ExtractResult};
use crate::id::{is_valid_custom_element_name, island_id, island_tag};
use crate::tree::{ComponentCall, Element, IslandPlaceholder, Node, SourceLocation};

/// One island call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IslandDescriptor {
    /// Stable id derived from the call site's source location.
    pub id: String,
    /// Custom-element tag unique to this call site.
    pub tag: String,
    /// Component name at the call site.
    pub component: String,
    /// Import path of the original implementation.
    pub import_path: String,
    /// Exported binding of the original implementation.
    pub export_name: String,
    /// Prop names passed at the call site.
    pub props: Vec<String>,
    pub location: SourceLocation,
}

/// Output of [`IslandExtractor::extract`].
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Tree with island call sites replaced by placeholders.
    pub server_tree: Node,
    /// Descriptors in tree order.
    pub islands: Vec<IslandDescriptor>,
    /// Client units keyed by island id.
    pub client_modules: BTreeMap<String, ClientUnit>,
}

impl Extraction {
    /// Descriptor of an island by id.
    pub fn island(&self, id: &str) -> Option<&IslandDescriptor> {
        self.islands.iter().find(|i| i.id == id)
    }
}

/// Build-time island extraction pass.
pub struct IslandExtractor {
    classifier: Box<dyn IslandClassifier>,
    tag_prefix: String,
    codegen: ClientCodegen,
}

impl Default for IslandExtractor {
    fn default() -> Self {
        Self {
            classifier: Box::new(NameSuffix::default()),
            tag_prefix: "island".to_string(),
            codegen: ClientCodegen::default(),
        }
    }
}

impl IslandExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure tag prefix and client codegen from the islands config.
    pub fn from_config(config: &IslandsConfig) -> Self {
        Self {
            tag_prefix: config.tag_prefix.clone(),
            codegen: ClientCodegen::from_config(config),
            ..Self::default()
        }
    }

    pub fn with_classifier(mut self, classifier: impl IslandClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    pub fn with_codegen(mut self, codegen: ClientCodegen) -> Self {
        self.codegen = codegen;
        self
    }

    /// Extract islands from a tree.
    ///
    /// Call sites the classifier accepts but that lack a source location, an
    /// import, or an importable export name are left as ordinary components.
    pub fn extract(&self, tree: &Node) -> ExtractResult<Extraction> {
        let sample = format!("{}-x", self.tag_prefix);
        if !is_valid_custom_element_name(&sample) {
            return Err(ExtractError::InvalidTagPrefix(self.tag_prefix.clone()));
        }

        let mut pass = Pass {
            extractor: self,
            islands: Vec::new(),
            client_modules: BTreeMap::new(),
        };
        let server_tree = pass.rewrite(tree)?;

        debug!(islands = pass.islands.len(), "Extracted islands");

        Ok(Extraction {
            server_tree,
            islands: pass.islands,
            client_modules: pass.client_modules,
        })
    }

    fn describe(&self, call: &ComponentCall) -> Option<IslandDescriptor> {
        let location = call.location.clone()?;
        let import = call.import.as_ref()?;
        if import.export != "default" && !is_js_identifier(&import.export) {
            return None;
        }
        let id = island_id(&location);
        Some(IslandDescriptor {
            tag: island_tag(&self.tag_prefix, &call.name, &id),
            id,
            component: call.name.clone(),
            import_path: import.path.clone(),
            export_name: import.export.clone(),
            props: call.props.keys().cloned().collect(),
            location,
        })
    }
}

struct Pass<'a> {
    extractor: &'a IslandExtractor,
    islands: Vec<IslandDescriptor>,
    client_modules: BTreeMap<String, ClientUnit>,
}

impl Pass<'_> {
    fn rewrite(&mut self, node: &Node) -> ExtractResult<Node> {
        Ok(match node {
            Node::Element(el) => Node::Element(Element {
                tag: el.tag.clone(),
                attrs: el.attrs.clone(),
                children: self.rewrite_all(&el.children)?,
            }),
            Node::Component(call) => {
                let lifted = self.lift(call)?;
                let children = self.rewrite_all(&call.children)?;
                match lifted {
                    Some(island) => Node::Island(IslandPlaceholder {
                        tag: island.tag,
                        island_id: island.id,
                        component: call.name.clone(),
                        props: call.props.clone(),
                        children,
                    }),
                    None => Node::Component(ComponentCall {
                        children,
                        ..call.clone()
                    }),
                }
            }
            Node::Island(island) => Node::Island(IslandPlaceholder {
                children: self.rewrite_all(&island.children)?,
                ..island.clone()
            }),
            Node::Fragment { children } => Node::Fragment {
                children: self.rewrite_all(children)?,
            },
            Node::Text { .. } | Node::Raw { .. } => node.clone(),
        })
    }

    fn rewrite_all(&mut self, nodes: &[Node]) -> ExtractResult<Vec<Node>> {
        nodes.iter().map(|n| self.rewrite(n)).collect()
    }

    /// Register a call site as an island, returning its descriptor.
    fn lift(&mut self, call: &ComponentCall) -> ExtractResult<Option<IslandDescriptor>> {
        if !self.extractor.classifier.is_island(call) {
            return Ok(None);
        }
        let Some(island) = self.extractor.describe(call) else {
            debug!(component = %call.name, "Island call site not statically resolvable; rendering as plain component");
            return Ok(None);
        };

        if let Some(existing) = self.islands.iter().find(|i| i.id == island.id) {
            return Err(ExtractError::DuplicateIsland {
                id: island.id.clone(),
                first: existing.location.clone(),
                second: island.location,
            });
        }

        debug!(
            id = %island.id,
            tag = %island.tag,
            location = %island.location,
            "Lifted island"
        );

        let unit = self.extractor.codegen.generate(&island);
        self.client_modules.insert(island.id.clone(), unit);
        self.islands.push(island.clone());
        Ok(Some(island))
    }
}
