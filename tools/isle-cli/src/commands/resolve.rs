//! URL resolution against the route table.

use anyhow::{bail, Result};
use isle_core::{Method, RequestContext};
use isle_router::{RouteEntry, RouteTable};
use serde::Serialize;
use serde_json::Value;

use super::{route_app, MatchArgs};
use crate::context::Context;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Resolution {
    kind: &'static str,
    route_id: String,
    route_path: String,
    params: Value,
}

/// Run the match command.
pub async fn run(args: MatchArgs, ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let app = route_app(
        config,
        &ctx.project_root(),
        args.pages.as_deref(),
        args.api.as_deref(),
    )?;

    let request = RequestContext::new(Method::Get, &args.url);
    let resolution = resolve("page", app.pages(), &request.path)
        .or_else(|| resolve("api", app.api(), &request.path));

    let Some(resolution) = resolution else {
        bail!("No route matches {}", request.path);
    };

    if ctx.output.is_json() {
        ctx.output.json(&resolution);
        return Ok(());
    }

    ctx.output.success(&format!("{} → {}", request.path, resolution.route_path));
    ctx.output.kv("kind", resolution.kind);
    ctx.output.kv("route", &resolution.route_id);
    ctx.output.kv("params", &resolution.params.to_string());
    Ok(())
}

fn resolve<M>(kind: &'static str, table: &RouteTable<M>, path: &str) -> Option<Resolution> {
    let matched = table.match_url(path)?;
    Some(describe(kind, matched.entry, matched.params.to_json()))
}

fn describe<M>(kind: &'static str, entry: &RouteEntry<M>, params: Value) -> Resolution {
    Resolution {
        kind,
        route_id: entry.id.clone(),
        route_path: entry.pattern.route_path().to_string(),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_router::RouteLoader;
    use serde_json::json;

    fn table() -> RouteTable<()> {
        RouteTable::builder()
            .route("blog/index.tsx", RouteLoader::ready(()))
            .unwrap()
            .route("blog/$id.tsx", RouteLoader::ready(()))
            .unwrap()
            .build()
    }

    #[test]
    fn test_resolve_dynamic_route() {
        let resolution = resolve("page", &table(), "/blog/42").unwrap();
        assert_eq!(resolution.route_path, "/blog/:id");
        assert_eq!(resolution.params, json!({ "id": "42" }));
    }

    #[test]
    fn test_static_route_wins() {
        let resolution = resolve("page", &table(), "/blog").unwrap();
        assert_eq!(resolution.route_path, "/blog/");
        assert_eq!(resolution.params, json!({}));
    }

    #[test]
    fn test_no_match() {
        assert!(resolve("page", &table(), "/about").is_none());
    }
}
