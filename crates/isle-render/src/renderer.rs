//! Island-aware server renderer.

use std::collections::HashMap;
use std::sync::Arc;

use isle_core::{IslandsConfig, RequestContext, RouteParams};
use isle_islands::{ComponentCall, Element, IslandPlaceholder, Node};
use serde_json::Value;
use tracing::trace;

use crate::error::{RenderError, RenderResult};
use crate::escape::{escape_attr, escape_html, is_valid_markup_name, is_void_element};
use crate::props::{encode_props, resolve_island_props, resolve_server_props, PropScope, ResolvedProps};

/// Maximum nesting of component expansions.
pub const MAX_RENDER_DEPTH: usize = 128;

/// A server-side component implementation.
pub trait Component: Send + Sync {
    fn render(&self, props: &ResolvedProps, children: &[Node]) -> RenderResult<Node>;
}

impl<F> Component for F
where
    F: Fn(&ResolvedProps, &[Node]) -> Node + Send + Sync,
{
    fn render(&self, props: &ResolvedProps, children: &[Node]) -> RenderResult<Node> {
        Ok(self(props, children))
    }
}

/// Component implementations by name. Populated at startup, read-only
/// afterwards.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under a name, replacing any previous one.
    pub fn with(mut self, name: impl Into<String>, component: impl Component + 'static) -> Self {
        self.components.insert(name.into(), Arc::new(component));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Component>> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.components.keys().collect();
        names.sort();
        f.debug_struct("ComponentRegistry").field("components", &names).finish()
    }
}

/// Per-request inputs to a render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub request_id: Option<String>,
    pub params: RouteParams,
    /// Page loader output.
    pub data: Value,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture what rendering needs from a request.
    pub fn from_request(ctx: &RequestContext) -> Self {
        Self {
            request_id: Some(ctx.request_id.to_string()),
            params: ctx.params.clone(),
            data: Value::Null,
        }
    }

    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    fn scope(&self) -> PropScope<'_> {
        PropScope {
            params: Some(&self.params),
            data: Some(&self.data),
        }
    }
}

/// Rendered page body and the islands it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    /// Island ids in document order, without duplicates.
    pub islands: Vec<String>,
}

/// Renders component trees to HTML strings.
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Arc<ComponentRegistry>,
    props_attribute: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(ComponentRegistry::new())
    }
}

impl Renderer {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            props_attribute: IslandsConfig::default().props_attribute,
        }
    }

    pub fn from_config(registry: ComponentRegistry, config: &IslandsConfig) -> Self {
        Self::new(registry).with_props_attribute(config.props_attribute.clone())
    }

    pub fn with_props_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.props_attribute = attribute.into();
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Render a tree to HTML.
    pub fn render(&self, tree: &Node, ctx: &RenderContext) -> RenderResult<String> {
        Ok(self.render_page(tree, ctx)?.html)
    }

    /// Render a tree, also reporting which islands it contains.
    pub fn render_page(&self, tree: &Node, ctx: &RenderContext) -> RenderResult<RenderedPage> {
        let mut out = Output::default();
        self.render_node(tree, ctx, 0, &mut out)?;
        Ok(RenderedPage {
            html: out.html,
            islands: out.islands,
        })
    }

    fn render_node(
        &self,
        node: &Node,
        ctx: &RenderContext,
        depth: usize,
        out: &mut Output,
    ) -> RenderResult<()> {
        match node {
            Node::Text { text } => out.html.push_str(&escape_html(text)),
            Node::Raw { html } => out.html.push_str(html),
            Node::Fragment { children } => self.render_children(children, ctx, depth, out)?,
            Node::Element(el) => self.render_element(el, ctx, depth, out)?,
            Node::Component(call) => self.render_component(call, ctx, depth, out)?,
            Node::Island(island) => self.render_island(island, ctx, depth, out)?,
        }
        Ok(())
    }

    fn render_children(
        &self,
        children: &[Node],
        ctx: &RenderContext,
        depth: usize,
        out: &mut Output,
    ) -> RenderResult<()> {
        for child in children {
            self.render_node(child, ctx, depth, out)?;
        }
        Ok(())
    }

    fn render_element(
        &self,
        el: &Element,
        ctx: &RenderContext,
        depth: usize,
        out: &mut Output,
    ) -> RenderResult<()> {
        check_name("tag", &el.tag)?;
        out.html.push('<');
        out.html.push_str(&el.tag);
        for (name, value) in &el.attrs {
            check_name("attribute", name)?;
            out.html.push_str(&format!(r#" {}="{}""#, name, escape_attr(value)));
        }
        out.html.push('>');

        if is_void_element(&el.tag) {
            return Ok(());
        }

        self.render_children(&el.children, ctx, depth, out)?;
        out.html.push_str(&format!("</{}>", el.tag));
        Ok(())
    }

    fn expand(
        &self,
        name: &str,
        props: &ResolvedProps,
        children: &[Node],
        depth: usize,
    ) -> RenderResult<Node> {
        if depth >= MAX_RENDER_DEPTH {
            return Err(RenderError::DepthExceeded {
                component: name.to_string(),
                limit: MAX_RENDER_DEPTH,
            });
        }
        let component = self
            .registry
            .get(name)
            .ok_or_else(|| RenderError::UnknownComponent(name.to_string()))?;
        trace!(component = name, depth, "Expanding component");
        component.render(props, children)
    }

    fn render_component(
        &self,
        call: &ComponentCall,
        ctx: &RenderContext,
        depth: usize,
        out: &mut Output,
    ) -> RenderResult<()> {
        let props = resolve_server_props(&call.props, &ctx.scope());
        let expanded = self.expand(&call.name, &props, &call.children, depth)?;
        self.render_node(&expanded, ctx, depth + 1, out)
    }

    /// `<tag data-props="{json}">{static markup}</tag>`.
    fn render_island(
        &self,
        island: &IslandPlaceholder,
        ctx: &RenderContext,
        depth: usize,
        out: &mut Output,
    ) -> RenderResult<()> {
        check_name("tag", &island.tag)?;
        check_name("attribute", &self.props_attribute)?;
        let props = resolve_island_props(&island.component, &island.props, &ctx.scope())?;
        let payload = encode_props(&props)?;

        if !out.islands.contains(&island.island_id) {
            out.islands.push(island.island_id.clone());
        }

        out.html.push_str(&format!(
            r#"<{} {}="{}">"#,
            island.tag,
            self.props_attribute,
            escape_attr(&payload)
        ));
        let expanded = self.expand(&island.component, &props, &island.children, depth)?;
        self.render_node(&expanded, ctx, depth + 1, out)?;
        out.html.push_str(&format!("</{}>", island.tag));
        Ok(())
    }
}

fn check_name(kind: &'static str, name: &str) -> RenderResult<()> {
    if is_valid_markup_name(name) {
        Ok(())
    } else {
        Err(RenderError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

#[derive(Default)]
struct Output {
    html: String,
    islands: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::decode_props;
    use isle_islands::{IslandExtractor, PropValue};
    use serde_json::json;

    fn counter(props: &ResolvedProps, _children: &[Node]) -> Node {
        Element::new("button")
            .with_child(Node::text(format!("Count: {}", props["count"])))
            .into()
    }

    fn registry() -> ComponentRegistry {
        ComponentRegistry::new()
            .with("CounterIsland", counter)
            .with("Layout", |_: &ResolvedProps, children: &[Node]| {
                Element::new("div")
                    .with_attr("class", "layout")
                    .with_child(Node::fragment(children.to_vec()))
                    .into()
            })
    }

    fn page() -> Node {
        ComponentCall::new("Layout")
            .with_child(Element::new("h1").with_child("Home"))
            .with_child(
                ComponentCall::new("CounterIsland")
                    .with_import("src/components/counter.tsx", "Counter")
                    .with_prop("count", json!(1))
                    .at("src/pages/index.tsx", 5, 9),
            )
            .into()
    }

    #[test]
    fn test_render_elements_and_text() {
        let tree: Node = Element::new("p")
            .with_attr("title", "a \"b\"")
            .with_child("1 < 2")
            .with_child(Element::new("br"))
            .into();
        let html = Renderer::default().render(&tree, &RenderContext::new()).unwrap();
        assert_eq!(html, r#"<p title="a &quot;b&quot;">1 &lt; 2<br></p>"#);
    }

    #[test]
    fn test_render_island_placeholder() {
        let extraction = IslandExtractor::new().extract(&page()).unwrap();
        let island = &extraction.islands[0];

        let rendered = Renderer::new(registry())
            .render_page(&extraction.server_tree, &RenderContext::new())
            .unwrap();

        let open = format!(r#"<{} data-props="{{&quot;count&quot;:1}}">"#, island.tag);
        assert!(rendered.html.contains(&open), "{}", rendered.html);
        assert!(rendered.html.contains("<button>Count: 1</button>"));
        assert!(rendered.html.contains(&format!("</{}>", island.tag)));
        assert!(rendered.html.starts_with(r#"<div class="layout"><h1>Home</h1>"#));
        assert_eq!(rendered.islands, vec![island.id.clone()]);
    }

    #[test]
    fn test_island_payload_round_trips() {
        let extraction = IslandExtractor::new().extract(&page()).unwrap();
        let html = Renderer::new(registry())
            .render(&extraction.server_tree, &RenderContext::new())
            .unwrap();

        let start = html.find("data-props=\"").unwrap() + "data-props=\"".len();
        let end = start + html[start..].find('"').unwrap();
        let payload = html[start..end].replace("&quot;", "\"");
        assert_eq!(decode_props(&payload).unwrap()["count"], json!(1));
    }

    #[test]
    fn test_island_props_resolved_per_request() {
        let tree = Node::Island(IslandPlaceholder {
            tag: "island-counter-1".into(),
            island_id: "1".into(),
            component: "CounterIsland".into(),
            props: [("count".to_string(), PropValue::Param("n".into()))].into(),
            children: vec![],
        });
        let ctx = RenderContext::new().with_params(RouteParams::new().with("n", "7"));
        let html = Renderer::new(registry()).render(&tree, &ctx).unwrap();
        assert!(html.contains("Count: \"7\""));
        assert!(html.contains("&quot;count&quot;:&quot;7&quot;"));
    }

    #[test]
    fn test_function_prop_fails_loudly() {
        let tree = Node::Island(IslandPlaceholder {
            tag: "island-counter-1".into(),
            island_id: "1".into(),
            component: "CounterIsland".into(),
            props: [("onClick".to_string(), PropValue::Function("inc".into()))].into(),
            children: vec![],
        });
        let err = Renderer::new(registry())
            .render(&tree, &RenderContext::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::NonSerializableProp { .. }));
    }

    #[test]
    fn test_unknown_component() {
        let tree: Node = ComponentCall::new("Missing").into();
        let err = Renderer::default().render(&tree, &RenderContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownComponent(name) if name == "Missing"));
    }

    #[test]
    fn test_self_recursive_component_is_bounded() {
        let registry = ComponentRegistry::new().with("Loop", |_: &ResolvedProps, _: &[Node]| {
            Node::Component(ComponentCall::new("Loop"))
        });
        let err = Renderer::new(registry)
            .render(&ComponentCall::new("Loop").into(), &RenderContext::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::DepthExceeded { .. }));
    }

    #[test]
    fn test_custom_props_attribute() {
        let tree = Node::Island(IslandPlaceholder {
            tag: "island-counter-1".into(),
            island_id: "1".into(),
            component: "CounterIsland".into(),
            props: [("count".to_string(), PropValue::Json(json!(2)))].into(),
            children: vec![],
        });
        let html = Renderer::new(registry())
            .with_props_attribute("data-island-props")
            .render(&tree, &RenderContext::new())
            .unwrap();
        assert!(html.starts_with(r#"<island-counter-1 data-island-props="#));
    }

    #[test]
    fn test_unsafe_names_rejected() {
        let tree: Node = Element::new("img src=x onerror=alert(1)").into();
        let err = Renderer::default().render(&tree, &RenderContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidName { kind: "tag", .. }));

        let tree: Node = Element::new("p")
            .with_attr("title=\"x\" onclick", "alert(1)")
            .into();
        let err = Renderer::default().render(&tree, &RenderContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidName { kind: "attribute", .. }));

        let tree = Node::Island(IslandPlaceholder {
            tag: "island-x><script".into(),
            island_id: "1".into(),
            component: "CounterIsland".into(),
            props: Default::default(),
            children: vec![],
        });
        let err = Renderer::new(registry()).render(&tree, &RenderContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidName { kind: "tag", ref name } if name == "island-x><script"));
    }
}
