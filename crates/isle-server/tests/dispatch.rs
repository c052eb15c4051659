//! End-to-end dispatch: island extraction, page rendering, API calls, hooks,
//! and hydration of the rendered document.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::StatusCode;
use isle_hydrate::{
    Dom, HydrationOptions, HydrationResult, HydrationRuntime, IntersectionEntry, IslandModule,
    IslandState, ModuleLoader, NodeId, VTree, ViewportObserver,
};
use isle_islands::{Extraction, IslandExtractor, IslandManifest, PropValue};
use isle_render::{decode_route_params, ResolvedProps, NOT_FOUND_BODY};
use isle_server::prelude::*;
use serde_json::json;

fn blog_tree() -> Node {
    Element::new("article")
        .with_child(
            Element::new("h1")
                .with_child(ComponentCall::new("Title").with_prop("text", PropValue::Data("/title".into()))),
        )
        .with_child(
            ComponentCall::new("LikeIsland")
                .with_import("src/islands/like.tsx", "Like")
                .with_prop("count", PropValue::Data("/likes".into()))
                .with_prop("post", PropValue::Param("id".into()))
                .at("src/pages/blog/$id.page.tsx", 14, 9),
        )
        .into()
}

fn extract() -> Extraction {
    IslandExtractor::new().extract(&blog_tree()).unwrap()
}

fn blog_page(extraction: &Extraction) -> PageModule {
    let tree = extraction.server_tree.clone();
    PageModule::new(move |_| tree.clone()).with_loader(|ctx| {
        let id = ctx.param("id").unwrap_or_default().to_string();
        async move {
            if id == "missing" {
                return Err::<_, BoxError>("post not found".into());
            }
            Ok(json!({ "title": format!("Post {}", id), "likes": 3 }))
        }
    })
}

fn users_api() -> ApiModule {
    ApiModule::new()
        .get(|ctx| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            let fields = ctx.query_param("fields").map(str::to_string);
            async move { Response::json(&json!({ "id": id, "fields": fields })) }
        })
        .post(|_| async { Response::text("created").with_status(StatusCode::CREATED) })
}

fn app_with(hooks: Vec<Arc<dyn Hook>>) -> (IsleApp, Extraction) {
    let extraction = extract();
    let mut manifest = IslandManifest::new();
    manifest.record(&extraction, "/islands");

    let mut builder = IsleApp::builder(IsleConfig::default())
        .unwrap()
        .page(
            "index.page.tsx",
            PageModule::new(|_| Element::new("h1").with_child("Home").into()),
        )
        .unwrap()
        .page("blog/$id.page.tsx", blog_page(&extraction))
        .unwrap()
        .page(
            "docs/$$path.page.tsx",
            PageModule::new(|props| {
                Node::text(format!("doc {}", props.params.get("path").unwrap_or("index")))
            }),
        )
        .unwrap()
        .api("users/$id.ts", users_api())
        .unwrap()
        .component("Title", |props: &ResolvedProps, _: &[Node]| {
            Node::text(props["text"].as_str().unwrap_or_default())
        })
        .component("LikeIsland", |props: &ResolvedProps, _: &[Node]| {
            Element::new("button")
                .with_child(Node::text(format!("{} likes", props["count"])))
                .into()
        })
        .manifest(manifest);
    for hook in hooks {
        builder = builder.hook(SharedHook(hook));
    }
    (builder.build(), extraction)
}

fn app() -> (IsleApp, Extraction) {
    app_with(Vec::new())
}

struct SharedHook(Arc<dyn Hook>);

#[async_trait]
impl Hook for SharedHook {
    async fn before_page_render(&self, ctx: &RequestContext) {
        self.0.before_page_render(ctx).await
    }

    async fn after_page_render(&self, ctx: &RequestContext, html: String) -> String {
        self.0.after_page_render(ctx, html).await
    }

    async fn before_api_call(&self, ctx: &RequestContext) {
        self.0.before_api_call(ctx).await
    }

    async fn after_api_call(&self, ctx: &RequestContext, response: Response) -> Response {
        self.0.after_api_call(ctx, response).await
    }
}

fn attr_value<'a>(html: &'a str, name: &str) -> &'a str {
    let key = format!("{}=\"", name);
    let start = html.find(&key).unwrap() + key.len();
    let len = html[start..].find('"').unwrap();
    &html[start..start + len]
}

#[tokio::test]
async fn test_page_renders_loader_data_and_island() {
    let (app, extraction) = app();
    let tag = &extraction.islands[0].tag;

    let response = app.handle(RequestContext::new(Method::Get, "/blog/42")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
    let html = &response.body;
    assert!(html.contains("<h1>Post 42</h1>"));
    assert!(html.contains(&format!("<{} data-props=", tag)));
    assert!(html.contains("<button>3 likes</button>"));
    assert!(html.contains(&format!(r#"src="/islands/{}.js""#, tag)));
    assert_eq!(attr_value(html, "data-entry-page"), "pages/blog/$id.page");
    assert_eq!(
        decode_route_params(attr_value(html, "data-route-params")),
        Some(json!({ "id": "42" }))
    );
}

#[tokio::test]
async fn test_static_and_catch_all_pages() {
    let (app, _) = app();

    let home = app.handle(RequestContext::new(Method::Get, "/")).await;
    assert!(home.body.contains("<h1>Home</h1>"));

    let docs = app.handle(RequestContext::new(Method::Get, "/docs/guide/setup")).await;
    assert!(docs.body.contains("doc guide/setup"));

    let docs_root = app.handle(RequestContext::new(Method::Get, "/docs")).await;
    assert!(docs_root.body.contains("doc index"));
}

#[tokio::test]
async fn test_params_are_percent_decoded() {
    let (app, _) = app();
    let response = app
        .handle(RequestContext::new(Method::Get, "/blog/hello%20world"))
        .await;
    assert!(response.body.contains("<h1>Post hello world</h1>"));
}

#[tokio::test]
async fn test_unmatched_url_is_not_found() {
    let (app, _) = app();
    let response = app.handle(RequestContext::new(Method::Get, "/nope/deeper")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains(NOT_FOUND_BODY));
}

#[tokio::test]
async fn test_loader_failure_is_a_server_error() {
    let (app, _) = app();

    let response = app.handle(RequestContext::new(Method::Get, "/blog/missing")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.contains("post not found"));

    let mut ctx = RequestContext::new(Method::Get, "/blog/missing");
    let err = app.dispatch(&mut ctx).await.unwrap_err();
    match err {
        IsleError::Loader { route, url, source } => {
            assert_eq!(route, "pages/blog/$id.page");
            assert_eq!(url, "/blog/missing");
            assert_eq!(source.to_string(), "post not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_module_load_failure_is_a_server_error() {
    let app = IsleApp::builder(IsleConfig::default())
        .unwrap()
        .page_loader(
            "broken.page.tsx",
            RouteLoader::new(|| async { Err(LoadError::new("pages/broken.page", "syntax error")) }),
        )
        .unwrap()
        .build();

    let mut ctx = RequestContext::new(Method::Get, "/broken");
    let err = app.dispatch(&mut ctx).await.unwrap_err();
    assert!(matches!(err, IsleError::ModuleLoad(_)));

    let response = app.handle(RequestContext::new(Method::Get, "/broken")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.contains("syntax error"));
}

#[tokio::test]
async fn test_function_prop_on_island_fails_render() {
    let tree: Node = ComponentCall::new("MenuIsland")
        .with_import("src/islands/menu.tsx", "Menu")
        .with_prop("onSelect", PropValue::Function("select".into()))
        .at("src/pages/menu.page.tsx", 3, 5)
        .into();
    let extraction = IslandExtractor::new().extract(&tree).unwrap();
    let server_tree = extraction.server_tree.clone();

    let app = IsleApp::builder(IsleConfig::default())
        .unwrap()
        .page("menu.page.tsx", PageModule::new(move |_| server_tree.clone()))
        .unwrap()
        .component("MenuIsland", |_: &ResolvedProps, _: &[Node]| Node::text("menu"))
        .build();

    let mut ctx = RequestContext::new(Method::Get, "/menu");
    let err = app.dispatch(&mut ctx).await.unwrap_err();
    assert!(matches!(err, IsleError::Render { ref route, .. } if route == "pages/menu.page"));
}

#[tokio::test]
async fn test_api_method_dispatch() {
    let (app, _) = app();

    let response = app
        .handle(RequestContext::new(Method::Get, "/api/users/7?fields=name"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body, json!({ "id": "7", "fields": "name" }));

    let created = app.handle(RequestContext::new(Method::Post, "/api/users/7")).await;
    assert_eq!(created.status, StatusCode::CREATED);

    let rejected = app
        .handle(RequestContext::new(Method::Delete, "/api/users/7"))
        .await;
    assert_eq!(rejected.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(rejected.header("allow"), Some("GET, POST"));
}

#[derive(Default)]
struct Audit {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl Hook for Audit {
    async fn before_page_render(&self, ctx: &RequestContext) {
        self.events.lock().unwrap().push(format!("page {}", ctx.path));
    }

    async fn after_page_render(&self, _ctx: &RequestContext, html: String) -> String {
        html.replace("</body>", "<!-- audited -->\n</body>")
    }

    async fn before_api_call(&self, ctx: &RequestContext) {
        self.events.lock().unwrap().push(format!("api {}", ctx.path));
    }

    async fn after_api_call(&self, _ctx: &RequestContext, response: Response) -> Response {
        response.with_header(http::header::CACHE_CONTROL, "no-store")
    }
}

#[tokio::test]
async fn test_hooks_wrap_pages_and_api_calls() {
    let audit = Arc::new(Audit::default());
    let hook: Arc<dyn Hook> = audit.clone();
    let (app, _) = app_with(vec![hook]);

    let page = app.handle(RequestContext::new(Method::Get, "/blog/1")).await;
    assert!(page.body.contains("<!-- audited -->"));

    let api = app.handle(RequestContext::new(Method::Get, "/api/users/1")).await;
    assert_eq!(api.header("cache-control"), Some("no-store"));

    app.handle(RequestContext::new(Method::Get, "/missing")).await;
    assert_eq!(
        *audit.events.lock().unwrap(),
        vec!["page /blog/1", "api /api/users/1"]
    );
}

#[derive(Default)]
struct Observer {
    observed: Vec<NodeId>,
}

impl ViewportObserver for Observer {
    fn observe(&mut self, target: NodeId, _threshold: f64) {
        self.observed.push(target);
    }

    fn unobserve(&mut self, target: NodeId) {
        self.observed.retain(|&id| id != target);
    }
}

struct LikeButton {
    seen: Arc<Mutex<Option<ResolvedProps>>>,
}

impl IslandModule for LikeButton {
    fn mount(&self, dom: &mut Dom, container: NodeId, tree: &VTree) -> HydrationResult<()> {
        *self.seen.lock().unwrap() = tree.props().cloned();
        let button = dom.create_element("button", &[("data-live", "true")]);
        dom.append_child(container, button);
        Ok(())
    }
}

struct Loader(Arc<dyn IslandModule>);

#[async_trait]
impl ModuleLoader for Loader {
    async fn load(&self, _tag: &str) -> HydrationResult<Arc<dyn IslandModule>> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_rendered_page_hydrates() {
    let (app, extraction) = app();
    let tag = extraction.islands[0].tag.clone();
    let response = app.handle(RequestContext::new(Method::Get, "/blog/42")).await;

    let seen = Arc::new(Mutex::new(None));
    let module = Arc::new(LikeButton { seen: seen.clone() });
    let dom = Dom::parse(&response.body).unwrap();
    let options = HydrationOptions::from_config(&app.config().islands);
    let mut runtime = HydrationRuntime::new(dom, options, Observer::default(), Loader(module));

    assert_eq!(runtime.define_all(), 1);
    let element = runtime.dom().find_elements(|t| t == tag)[0];
    assert_eq!(runtime.state(element), Some(IslandState::Armed));
    assert_eq!(runtime.observer().observed, vec![element]);

    runtime
        .on_intersection(&[IntersectionEntry::new(element, 0.1)])
        .await;
    assert_eq!(runtime.state(element), Some(IslandState::Armed));

    runtime
        .on_intersection(&[IntersectionEntry::new(element, 0.5)])
        .await;
    assert_eq!(runtime.state(element), Some(IslandState::Mounted));
    assert!(runtime.observer().observed.is_empty());
    assert_eq!(
        serde_json::Value::Object(seen.lock().unwrap().clone().unwrap()),
        json!({ "count": 3, "post": "42" })
    );
    assert!(runtime.dom().inner_html(element).contains(r#"data-live="true""#));
}
