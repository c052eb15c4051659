//! Route table inspection.

use anyhow::Result;
use isle_router::RouteDescriptor;
use serde::Serialize;

use super::{route_app, RoutesArgs};
use crate::context::Context;
use crate::output::column_widths;

#[derive(Serialize)]
struct RouteListing {
    pages: Vec<RouteDescriptor>,
    api: Vec<RouteDescriptor>,
}

/// Run the routes command.
pub async fn run(args: RoutesArgs, ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let app = route_app(
        config,
        &ctx.project_root(),
        args.pages.as_deref(),
        args.api.as_deref(),
    )?;

    let listing = RouteListing {
        pages: app.pages().describe(),
        api: app.api().describe(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&listing);
        return Ok(());
    }

    print_table(ctx, "Pages", &listing.pages);
    print_table(ctx, "API", &listing.api);
    Ok(())
}

fn print_table(ctx: &Context, title: &str, routes: &[RouteDescriptor]) {
    ctx.output.header(&format!("{} ({})", title, routes.len()));
    if routes.is_empty() {
        ctx.output.info("No routes found.");
        return;
    }

    let header = ["PATH", "ROUTE ID", "PARAMS", "RANK", "PATTERN"];
    let rows: Vec<Vec<String>> = routes.iter().map(row).collect();
    let widths = column_widths(&header, &rows);

    ctx.output.table_row(&header, &widths);
    for row in &rows {
        let cols: Vec<&str> = row.iter().map(String::as_str).collect();
        ctx.output.table_row(&cols, &widths);
    }
}

fn row(route: &RouteDescriptor) -> Vec<String> {
    vec![
        route.route_path.clone(),
        route.route_id.clone(),
        if route.pattern.param_names.is_empty() {
            "-".to_string()
        } else {
            route.pattern.param_names.join(", ")
        },
        rank_label(route),
        route.pattern.source.clone(),
    ]
}

/// `dynamic/total`, with `*` for catch-all routes.
fn rank_label(route: &RouteDescriptor) -> String {
    let rank = &route.specificity_rank;
    format!(
        "{}/{}{}",
        rank.dynamic_segments,
        rank.total_segments,
        if rank.catch_all { "*" } else { "" }
    )
}
