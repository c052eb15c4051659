//! API modules and method dispatch.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use isle_core::{Method, RequestContext};

use crate::response::Response;

/// A boxed API handler.
pub type ApiHandler = Arc<dyn Fn(&RequestContext) -> BoxFuture<'static, Response> + Send + Sync>;

fn boxed<F, Fut>(handler: F) -> ApiHandler
where
    F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx: &RequestContext| handler(ctx).boxed())
}

/// What an API route file exports: per-method handlers and an optional
/// default handler for every other method.
#[derive(Clone, Default)]
pub struct ApiModule {
    handlers: HashMap<Method, ApiHandler>,
    fallback: Option<ApiHandler>,
}

impl ApiModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for one method.
    pub fn handler<F, Fut>(mut self, method: Method, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handlers.insert(method, boxed(handler));
        self
    }

    pub fn get<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handler(Method::Get, handler)
    }

    pub fn post<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handler(Method::Post, handler)
    }

    pub fn put<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handler(Method::Put, handler)
    }

    pub fn patch<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handler(Method::Patch, handler)
    }

    pub fn delete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handler(Method::Delete, handler)
    }

    /// Handler for methods without their own handler.
    pub fn fallback<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.fallback = Some(boxed(handler));
        self
    }

    /// The exact method handler, else the fallback.
    pub fn handler_for(&self, method: Method) -> Option<&ApiHandler> {
        self.handlers.get(&method).or(self.fallback.as_ref())
    }

    /// Methods with their own handler, in `Allow` header order.
    pub fn allowed_methods(&self) -> Vec<Method> {
        Method::ALL
            .into_iter()
            .filter(|m| self.handlers.contains_key(m))
            .collect()
    }

    /// Call the handler for the request's method, or answer `405`.
    pub async fn call(&self, ctx: &RequestContext) -> Response {
        match self.handler_for(ctx.method) {
            Some(handler) => handler(ctx).await,
            None => Response::method_not_allowed(&self.allowed_methods()),
        }
    }
}

impl fmt::Debug for ApiModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiModule")
            .field("methods", &self.allowed_methods())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
