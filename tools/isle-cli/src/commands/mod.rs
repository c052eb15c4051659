//! CLI command implementations.

pub mod config;
pub mod islands;
pub mod resolve;
pub mod routes;

use std::path::Path;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use isle_core::IsleConfig;
use isle_server::{ApiModule, IsleApp, Node, PageModule, RouteLoader};
use tracing::debug;

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {
    /// Pages routes root (overrides `routes.pages_dir`).
    #[arg(long)]
    pub pages: Option<String>,

    /// API routes root (overrides `routes.api_dir`).
    #[arg(long)]
    pub api: Option<String>,
}

/// Arguments for the match command.
#[derive(Args)]
pub struct MatchArgs {
    /// URL path to resolve, query string allowed.
    pub url: String,

    /// Pages routes root (overrides `routes.pages_dir`).
    #[arg(long)]
    pub pages: Option<String>,

    /// API routes root (overrides `routes.api_dir`).
    #[arg(long)]
    pub api: Option<String>,
}

/// Arguments for the islands command.
#[derive(Args)]
pub struct IslandsArgs {
    /// Serialized component trees (JSON).
    #[arg(required = true)]
    pub trees: Vec<String>,

    /// Output directory (overrides `islands.out_dir`).
    #[arg(short, long)]
    pub out: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Validate the config file and route roots.
    Validate,
    /// Write a default `isle.toml`.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Compile the project's route files into an app. Modules are placeholders:
/// only the tables are inspected.
pub(crate) fn route_app(
    config: IsleConfig,
    root: &Path,
    pages: Option<&str>,
    api: Option<&str>,
) -> Result<IsleApp> {
    let mut config = config;
    if let Some(dir) = pages {
        config = config.with_pages_dir(dir);
    }
    if let Some(dir) = api {
        config = config.with_api_dir(dir);
    }

    let app = IsleApp::builder(config)?
        .discover_pages(root, |_| {
            Some(RouteLoader::ready(PageModule::new(|_| Node::text(""))))
        })
        .context("Failed to compile page routes")?
        .discover_api(root, |_| Some(RouteLoader::ready(ApiModule::new())))
        .context("Failed to compile API routes")?
        .build();
    debug!(
        root = %root.display(),
        pages = app.pages().len(),
        api = app.api().len(),
        "Compiled project routes"
    );
    Ok(app)
}
