//! Page modules.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use isle_core::{QueryParams, RequestContext, RouteParams};
use isle_islands::Node;
use isle_render::HeadContent;
use serde_json::Value;

use crate::error::BoxError;

/// Inputs a page renders from.
#[derive(Debug, Clone, Default)]
pub struct PageProps {
    pub params: RouteParams,
    pub query: QueryParams,
    /// Loader output, `null` for pages without a loader.
    pub data: Value,
}

type RenderFn = Arc<dyn Fn(&PageProps) -> Node + Send + Sync>;
type LoaderFn = Arc<dyn Fn(&RequestContext) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// What a page route file exports: a render function and an optional
/// async data loader.
#[derive(Clone)]
pub struct PageModule {
    render: RenderFn,
    loader: Option<LoaderFn>,
    head: Option<HeadContent>,
}

impl PageModule {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&PageProps) -> Node + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
            loader: None,
            head: None,
        }
    }

    /// Attach a data loader. It runs once per request before rendering and
    /// its output becomes [`PageProps::data`].
    pub fn with_loader<F, Fut>(mut self, loader: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        self.loader = Some(Arc::new(move |ctx: &RequestContext| loader(ctx).boxed()));
        self
    }

    /// Override the document head for this page.
    pub fn with_head(mut self, head: HeadContent) -> Self {
        self.head = Some(head);
        self
    }

    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    pub fn head(&self) -> Option<&HeadContent> {
        self.head.as_ref()
    }

    /// Run the loader, or yield `null` when there is none.
    pub async fn load(&self, ctx: &RequestContext) -> Result<Value, BoxError> {
        match &self.loader {
            Some(loader) => loader(ctx).await,
            None => Ok(Value::Null),
        }
    }

    pub fn render(&self, props: &PageProps) -> Node {
        (self.render)(props)
    }
}

impl fmt::Debug for PageModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageModule")
            .field("loader", &self.loader.is_some())
            .field("head", &self.head)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_core::Method;
    use isle_islands::Element;
    use serde_json::json;

    #[tokio::test]
    async fn test_page_without_loader_yields_null() {
        let page = PageModule::new(|_| Node::text("hi"));
        let ctx = RequestContext::new(Method::Get, "/");
        assert!(!page.has_loader());
        assert_eq!(page.load(&ctx).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_loader_reads_request() {
        let page = PageModule::new(|props| {
            Element::new("h1")
                .with_child(Node::text(props.data["title"].as_str().unwrap_or_default()))
                .into()
        })
        .with_loader(|ctx| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            async move { Ok::<_, BoxError>(json!({ "title": format!("Post {}", id) })) }
        });

        let mut ctx = RequestContext::new(Method::Get, "/blog/7");
        ctx.params = RouteParams::new().with("id", "7");
        let data = page.load(&ctx).await.unwrap();
        assert_eq!(data, json!({ "title": "Post 7" }));

        let tree = page.render(&PageProps {
            data,
            ..Default::default()
        });
        assert!(matches!(tree, Node::Element(ref el) if el.tag == "h1"));
    }

    #[tokio::test]
    async fn test_loader_error_propagates() {
        let page = PageModule::new(|_| Node::text("x"))
            .with_loader(|_| async { Err::<Value, BoxError>("database down".into()) });
        let ctx = RequestContext::new(Method::Get, "/");
        let err = page.load(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "database down");
    }
}
