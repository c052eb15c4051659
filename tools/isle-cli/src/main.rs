//! Isle CLI - Command line tool for the Isle islands framework.
//!
//! Commands:
//! - `isle routes` - Print the compiled route table in match order
//! - `isle match` - Resolve a URL against the route table
//! - `isle islands` - Extract islands from component trees
//! - `isle config` - Manage configuration

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigArgs, IslandsArgs, MatchArgs, RoutesArgs};

/// Isle CLI - Inspect routes and build islands
#[derive(Parser)]
#[command(name = "isle")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table in match order
    Routes(RoutesArgs),

    /// Show which route a URL resolves to
    Match(MatchArgs),

    /// Extract islands and write client units
    Islands(IslandsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = output::Output::new(cli.verbose, cli.json);

    let result = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => match cli.command {
            Commands::Routes(args) => commands::routes::run(args, &ctx).await,
            Commands::Match(args) => commands::resolve::run(args, &ctx).await,
            Commands::Islands(args) => commands::islands::run(args, &ctx).await,
            Commands::Config(args) => commands::config::run(args, &ctx).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
