//! Ordered route table with first-match lookup.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use isle_core::RouteParams;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{LoadError, RouteResult};
use crate::order::SpecificityRank;
use crate::pattern::{PatternCompiler, RoutePattern};
use crate::source::RouteSource;

/// Future returned by a [`RouteLoader`].
pub type LoadFuture<M> = BoxFuture<'static, Result<M, LoadError>>;

/// Deferred module loader bound to a route.
///
/// Invoked once per matching request. Caching the loaded module is up to
/// whoever supplies the closure.
pub struct RouteLoader<M> {
    load: Arc<dyn Fn() -> LoadFuture<M> + Send + Sync>,
}

impl<M: Send + 'static> RouteLoader<M> {
    /// Wrap an async closure.
    pub fn new<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, LoadError>> + Send + 'static,
    {
        Self {
            load: Arc::new(move || load().boxed()),
        }
    }

    /// A loader that always yields a clone of an already-built module.
    pub fn ready(module: M) -> Self
    where
        M: Clone + Sync,
    {
        Self::new(move || futures::future::ready(Ok(module.clone())))
    }

    /// Run the loader.
    pub async fn load(&self) -> Result<M, LoadError> {
        (self.load)().await
    }
}

impl<M> Clone for RouteLoader<M> {
    fn clone(&self) -> Self {
        Self {
            load: Arc::clone(&self.load),
        }
    }
}

impl<M> fmt::Debug for RouteLoader<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteLoader")
    }
}

/// A compiled pattern bound to a loader and a logical route id.
#[derive(Debug, Clone)]
pub struct RouteEntry<M> {
    /// Logical route id (`pages/blog/$id`), used to correlate client assets.
    pub id: String,
    /// Compiled pattern.
    pub pattern: RoutePattern,
    /// Deferred module loader.
    pub loader: RouteLoader<M>,
}

impl<M> RouteEntry<M> {
    /// Serializable shape of this entry.
    pub fn describe(&self) -> RouteDescriptor {
        RouteDescriptor {
            route_path: self.pattern.route_path().to_string(),
            pattern: PatternDescriptor {
                source: self.pattern.pattern_source().to_string(),
                param_names: self.pattern.param_names().to_vec(),
            },
            specificity_rank: self.pattern.rank().clone(),
            route_id: self.id.clone(),
        }
    }
}

/// Compiled route shape handed to dispatch and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub route_path: String,
    pub pattern: PatternDescriptor,
    pub specificity_rank: SpecificityRank,
    pub route_id: String,
}

/// Matching expression and its parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDescriptor {
    pub source: String,
    pub param_names: Vec<String>,
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, M> {
    pub entry: &'a RouteEntry<M>,
    pub params: RouteParams,
}

/// Routes sorted by specificity. Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct RouteTable<M> {
    entries: Vec<RouteEntry<M>>,
}

impl<M> Default for RouteTable<M> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<M> RouteTable<M> {
    /// Start building a table with a default compiler.
    pub fn builder() -> RouteTableBuilder<M> {
        RouteTableBuilder::new(PatternCompiler::new())
    }

    /// Entries in match order.
    pub fn entries(&self) -> &[RouteEntry<M>] {
        &self.entries
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by route id.
    pub fn get(&self, id: &str) -> Option<&RouteEntry<M>> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Return the first entry whose pattern matches `url`. The query string
    /// and fragment are ignored. `None` is a normal not-found outcome.
    pub fn match_url(&self, url: &str) -> Option<RouteMatch<'_, M>> {
        let path = strip_query(url);
        let path = if path.is_empty() { "/" } else { path };

        self.entries.iter().find_map(|entry| {
            entry
                .pattern
                .match_path(path)
                .map(|params| RouteMatch { entry, params })
        })
    }

    /// Serializable shape of every entry, in match order.
    pub fn describe(&self) -> Vec<RouteDescriptor> {
        self.entries.iter().map(RouteEntry::describe).collect()
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

/// Collects routes and sorts them into a [`RouteTable`].
pub struct RouteTableBuilder<M> {
    compiler: PatternCompiler,
    id_prefix: Option<String>,
    entries: Vec<RouteEntry<M>>,
}

impl<M> RouteTableBuilder<M> {
    /// Create a builder around a compiler.
    pub fn new(compiler: PatternCompiler) -> Self {
        Self {
            compiler,
            id_prefix: None,
            entries: Vec::new(),
        }
    }

    /// Prefix route ids with the routes root name (`pages`, `api`).
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    /// The compiler routes are compiled with.
    pub fn compiler(&self) -> &PatternCompiler {
        &self.compiler
    }

    /// Compile a route file path and bind it to a loader.
    pub fn route(self, path: &str, loader: RouteLoader<M>) -> RouteResult<Self> {
        let source = RouteSource::parse_with_markers(path, self.compiler.markers())?;
        self.source(source, loader)
    }

    /// Bind an already-parsed route source to a loader.
    pub fn source(mut self, source: RouteSource, loader: RouteLoader<M>) -> RouteResult<Self> {
        let id = route_id(self.id_prefix.as_deref(), &source);
        let pattern = self.compiler.compile_source(source)?;
        self.entries.push(RouteEntry {
            id,
            pattern,
            loader,
        });
        Ok(self)
    }

    /// Sort the routes by specificity. When two sources normalize to the
    /// same route path only the first in match order is kept.
    pub fn build(mut self) -> RouteTable<M> {
        self.entries
            .sort_by(|a, b| a.pattern.cmp_specificity(&b.pattern));

        let mut entries: Vec<RouteEntry<M>> = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            if let Some(kept) = entries
                .iter()
                .find(|e| e.pattern.route_path() == entry.pattern.route_path())
            {
                warn!(
                    route_path = %entry.pattern.route_path(),
                    kept = %kept.pattern.source().raw,
                    ignored = %entry.pattern.source().raw,
                    "Duplicate route path"
                );
                continue;
            }
            entries.push(entry);
        }

        debug!(routes = entries.len(), "Built route table");
        RouteTable { entries }
    }
}

/// Logical id: the normalized source path without its extension.
fn route_id(prefix: Option<&str>, source: &RouteSource) -> String {
    let normalized = source.raw.replace('\\', "/");
    let trimmed = normalized.trim_start_matches("./").trim_matches('/');
    let stem = match &source.extension {
        Some(ext) => trimmed
            .strip_suffix(ext.as_str())
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(trimmed),
        None => trimmed,
    };
    match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), stem),
        None => stem.to_string(),
    }
}
