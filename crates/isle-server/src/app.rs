//! Application builder and request dispatch.
//!
//! A request is matched against page routes first, then API routes. A page
//! match loads the page module, runs its loader, renders the tree and wraps
//! it in the document shell. An API match calls the handler for the request
//! method. Anything else gets the not-found document.

use std::path::Path;

use http::StatusCode;
use isle_core::{IsleConfig, LifecyclePhase, RequestContext};
use isle_islands::IslandManifest;
use isle_render::{Component, ComponentRegistry, Document, RenderContext, Renderer};
use isle_router::{
    discover, DiscoverOptions, PatternCompiler, RouteEntry, RouteLoader, RouteSource, RouteTable,
    RouteTableBuilder,
};
use tracing::{debug, info};

use crate::api::ApiModule;
use crate::error::{IsleError, IsleResult};
use crate::hooks::{Hook, HookRegistry};
use crate::logging::RequestLogger;
use crate::page::{PageModule, PageProps};
use crate::response::Response;

/// A built application: route tables, renderer and hooks. Shared read-only
/// across requests.
#[derive(Debug)]
pub struct IsleApp {
    config: IsleConfig,
    pages: RouteTable<PageModule>,
    api: RouteTable<ApiModule>,
    renderer: Renderer,
    manifest: IslandManifest,
    hooks: HookRegistry,
}

impl IsleApp {
    /// Start building an app. The configuration is validated first.
    pub fn builder(config: IsleConfig) -> IsleResult<IsleAppBuilder> {
        config.validate()?;
        Ok(IsleAppBuilder::new(config))
    }

    pub fn config(&self) -> &IsleConfig {
        &self.config
    }

    /// Page routes in match order.
    pub fn pages(&self) -> &RouteTable<PageModule> {
        &self.pages
    }

    /// API routes in match order.
    pub fn api(&self) -> &RouteTable<ApiModule> {
        &self.api
    }

    pub fn manifest(&self) -> &IslandManifest {
        &self.manifest
    }

    /// Handle a request. Dispatch errors become the error document.
    pub async fn handle(&self, mut ctx: RequestContext) -> Response {
        let mut logger = RequestLogger::new(ctx.request_id.clone()).with_method(ctx.method);
        ctx.timing.mark_phase(&LifecyclePhase::Start);

        let response = match self.route(&mut ctx, &mut logger).await {
            Ok(response) => response,
            Err(err) => {
                ctx.timing
                    .mark_phase(&LifecyclePhase::Error(err.to_string()));
                logger.error_builder("Request failed").error(&err).emit();
                self.error_page(&err)
            }
        };

        ctx.timing.mark_phase(&LifecyclePhase::Completion);
        logger
            .info_builder("Request complete")
            .path(ctx.path.as_str())
            .status(response.status)
            .elapsed(ctx.timing.elapsed())
            .emit();
        response
    }

    /// Dispatch a request, returning errors instead of rendering them.
    pub async fn dispatch(&self, ctx: &mut RequestContext) -> IsleResult<Response> {
        let mut logger = RequestLogger::new(ctx.request_id.clone()).with_method(ctx.method);
        self.route(ctx, &mut logger).await
    }

    async fn route(
        &self,
        ctx: &mut RequestContext,
        logger: &mut RequestLogger,
    ) -> IsleResult<Response> {
        if let Some(matched) = self.pages.match_url(&ctx.path) {
            ctx.params = matched.params;
            return self.render_page(matched.entry, ctx, logger).await;
        }

        if let Some(matched) = self.api.match_url(&ctx.path) {
            ctx.params = matched.params;
            return self.call_api(matched.entry, ctx, logger).await;
        }

        debug!(path = %ctx.path, "No route matched");
        Ok(self.not_found())
    }

    async fn render_page(
        &self,
        entry: &RouteEntry<PageModule>,
        ctx: &mut RequestContext,
        logger: &mut RequestLogger,
    ) -> IsleResult<Response> {
        ctx.timing
            .mark_phase(&LifecyclePhase::RouteMatched(entry.id.clone()));
        logger.set_route(&entry.id);

        let module = entry.loader.load().await?;
        self.hooks.before_page_render(ctx).await;

        let data = module
            .load(ctx)
            .await
            .map_err(|source| IsleError::Loader {
                route: entry.id.clone(),
                url: ctx.path.clone(),
                source,
            })?;
        ctx.timing.mark_phase(&LifecyclePhase::DataLoaded);

        let props = PageProps {
            params: ctx.params.clone(),
            query: ctx.query.clone(),
            data: data.clone(),
        };
        let tree = module.render(&props);
        let render_ctx = RenderContext::from_request(ctx).with_data(data);
        let page = self
            .renderer
            .render_page(&tree, &render_ctx)
            .map_err(|source| IsleError::Render {
                route: entry.id.clone(),
                source,
            })?;
        ctx.timing.mark_phase(&LifecyclePhase::Rendered);

        let mut document = Document::new(&self.config.render)
            .with_entry_page(&entry.id)
            .with_route_params(&ctx.params)
            .with_body(page.html);
        if let Some(head) = module.head() {
            document = document.with_head(head.clone());
        }
        for id in &page.islands {
            match self.manifest.client_path(id) {
                Some(path) => document = document.with_script(path),
                None => debug!(island = %id, "No client unit for island"),
            }
        }

        let html = self.hooks.after_page_render(ctx, document.render()).await;
        Ok(Response::html(html))
    }

    async fn call_api(
        &self,
        entry: &RouteEntry<ApiModule>,
        ctx: &mut RequestContext,
        logger: &mut RequestLogger,
    ) -> IsleResult<Response> {
        ctx.timing
            .mark_phase(&LifecyclePhase::RouteMatched(entry.id.clone()));
        logger.set_route(&entry.id);

        let module = entry.loader.load().await?;
        self.hooks.before_api_call(ctx).await;
        let response = module.call(ctx).await;
        Ok(self.hooks.after_api_call(ctx, response).await)
    }

    fn not_found(&self) -> Response {
        Response::html(Document::not_found(&self.config.render).render())
            .with_status(StatusCode::NOT_FOUND)
    }

    fn error_page(&self, err: &IsleError) -> Response {
        Response::html(Document::error(&self.config.render, &err.to_string()).render())
            .with_status(err.status())
    }
}

/// Collects routes, components and hooks into an [`IsleApp`].
pub struct IsleAppBuilder {
    config: IsleConfig,
    pages: RouteTableBuilder<PageModule>,
    api: RouteTableBuilder<ApiModule>,
    components: ComponentRegistry,
    manifest: IslandManifest,
    hooks: HookRegistry,
}

impl IsleAppBuilder {
    fn new(config: IsleConfig) -> Self {
        let markers = [config.routes.page_marker.clone(), "api".to_string()];
        let pages = RouteTableBuilder::new(PatternCompiler::new().with_markers(markers.clone()))
            .with_id_prefix("pages");
        let api = RouteTableBuilder::new(
            PatternCompiler::new()
                .with_prefix(&config.routes.api_prefix)
                .with_markers(markers),
        )
        .with_id_prefix("api");

        Self {
            config,
            pages,
            api,
            components: ComponentRegistry::new(),
            manifest: IslandManifest::new(),
            hooks: HookRegistry::new(),
        }
    }

    /// Register a page module under a route file path (`blog/$id.page.tsx`).
    pub fn page(self, path: &str, module: PageModule) -> IsleResult<Self> {
        self.page_loader(path, RouteLoader::ready(module))
    }

    /// Register a page route with a deferred module loader.
    pub fn page_loader(mut self, path: &str, loader: RouteLoader<PageModule>) -> IsleResult<Self> {
        self.pages = self.pages.route(path, loader)?;
        Ok(self)
    }

    /// Register an API module under a route file path, mounted below the
    /// API prefix.
    pub fn api(self, path: &str, module: ApiModule) -> IsleResult<Self> {
        self.api_loader(path, RouteLoader::ready(module))
    }

    pub fn api_loader(mut self, path: &str, loader: RouteLoader<ApiModule>) -> IsleResult<Self> {
        self.api = self.api.route(path, loader)?;
        Ok(self)
    }

    /// Discover page route files under the configured pages root of
    /// `project_root`. `resolve` supplies the module of each file; a file
    /// it cannot resolve is an error. Files carrying the API designator
    /// are skipped.
    pub fn discover_pages<F>(mut self, project_root: &Path, resolve: F) -> IsleResult<Self>
    where
        F: Fn(&RouteSource) -> Option<RouteLoader<PageModule>>,
    {
        let root = project_root.join(&self.config.routes.pages_dir);
        let options = DiscoverOptions::from_config(&self.config.routes);
        for source in discover(&root, &options)? {
            if has_designator(&source.raw, "api") {
                continue;
            }
            let loader = resolve(&source).ok_or_else(|| IsleError::UnresolvedRoute {
                path: source.raw.clone(),
            })?;
            self.pages = self.pages.source(source, loader)?;
        }
        Ok(self)
    }

    /// Discover API route files under the configured API root of
    /// `project_root`.
    pub fn discover_api<F>(mut self, project_root: &Path, resolve: F) -> IsleResult<Self>
    where
        F: Fn(&RouteSource) -> Option<RouteLoader<ApiModule>>,
    {
        let root = project_root.join(&self.config.routes.api_dir);
        let options = DiscoverOptions::from_config(&self.config.routes);
        for source in discover(&root, &options)? {
            let loader = resolve(&source).ok_or_else(|| IsleError::UnresolvedRoute {
                path: source.raw.clone(),
            })?;
            self.api = self.api.source(source, loader)?;
        }
        Ok(self)
    }

    /// Register a server component by name.
    pub fn component(mut self, name: impl Into<String>, component: impl Component + 'static) -> Self {
        self.components = self.components.with(name, component);
        self
    }

    pub fn components(mut self, registry: ComponentRegistry) -> Self {
        self.components = registry;
        self
    }

    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.register(hook);
        self
    }

    /// Island manifest used to add client unit scripts to pages.
    pub fn manifest(mut self, manifest: IslandManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Load the island manifest from a build output directory.
    pub fn load_manifest(self, dir: &Path) -> IsleResult<Self> {
        let manifest = IslandManifest::load(dir)?;
        Ok(self.manifest(manifest))
    }

    pub fn build(self) -> IsleApp {
        let renderer = Renderer::from_config(self.components, &self.config.islands);
        let pages = self.pages.build();
        let api = self.api.build();
        info!(
            pages = pages.len(),
            api = api.len(),
            islands = self.manifest.islands.len(),
            "Built app"
        );

        IsleApp {
            config: self.config,
            pages,
            api,
            renderer,
            manifest: self.manifest,
            hooks: self.hooks,
        }
    }
}

/// Whether a route file name carries `marker` as a designator
/// (`users.api.ts`).
fn has_designator(raw: &str, marker: &str) -> bool {
    let file = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(raw);
    let parts: Vec<&str> = file.split('.').collect();
    parts.len() > 2 && parts[1..parts.len() - 1].contains(&marker)
}
