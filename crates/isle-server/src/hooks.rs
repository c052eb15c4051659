//! Dispatch hooks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use isle_core::RequestContext;

use crate::response::Response;

/// Callbacks around page rendering and API calls.
///
/// Every method has a no-op default, so a hook implements only the events
/// it cares about.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Runs after the page route matched, before its loader.
    async fn before_page_render(&self, _ctx: &RequestContext) {}

    /// Runs on the finished document. The returned HTML is sent.
    async fn after_page_render(&self, _ctx: &RequestContext, html: String) -> String {
        html
    }

    /// Runs after the API route matched, before its handler.
    async fn before_api_call(&self, _ctx: &RequestContext) {}

    /// Runs on the handler's response. The returned response is sent.
    async fn after_api_call(&self, _ctx: &RequestContext, response: Response) -> Response {
        response
    }
}

/// Registered hooks. Populated at startup, read-only afterwards.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl Hook + 'static) {
        self.hooks.push(Arc::new(hook));
    }

    pub fn with(mut self, hook: impl Hook + 'static) -> Self {
        self.register(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub async fn before_page_render(&self, ctx: &RequestContext) {
        for hook in &self.hooks {
            hook.before_page_render(ctx).await;
        }
    }

    pub async fn after_page_render(&self, ctx: &RequestContext, mut html: String) -> String {
        for hook in &self.hooks {
            html = hook.after_page_render(ctx, html).await;
        }
        html
    }

    pub async fn before_api_call(&self, ctx: &RequestContext) {
        for hook in &self.hooks {
            hook.before_api_call(ctx).await;
        }
    }

    pub async fn after_api_call(&self, ctx: &RequestContext, mut response: Response) -> Response {
        for hook in &self.hooks {
            response = hook.after_api_call(ctx, response).await;
        }
        response
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
