//! Configuration management commands.

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};
use isle_core::{generate_default_config, IsleConfig, CONFIG_FILE_NAMES};

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;

    if ctx.output.is_json() {
        ctx.output.json(&config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    ctx.output.info("[routes]");
    ctx.output.kv("pages_dir", &config.routes.pages_dir);
    ctx.output.kv("api_dir", &config.routes.api_dir);
    ctx.output.kv("api_prefix", &config.routes.api_prefix);
    ctx.output.kv("page_marker", &config.routes.page_marker);
    ctx.output.kv("extensions", &config.routes.extensions.join(", "));

    ctx.output.info("[islands]");
    ctx.output.kv("tag_prefix", &config.islands.tag_prefix);
    ctx.output.kv("props_attribute", &config.islands.props_attribute);
    ctx.output.kv("threshold", &config.islands.threshold.to_string());
    ctx.output.kv("out_dir", &config.islands.out_dir);
    ctx.output.kv("public_path", &config.islands.public_path);

    ctx.output.info("[render]");
    ctx.output.kv("lang", &config.render.lang);
    ctx.output.kv("title", &config.render.title);

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let config = ctx.config()?;
    let warnings = check_project(&config, &ctx.project_root());

    if warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }
    ctx.output.success("Configuration is valid (with warnings)");
    Ok(())
}

/// Problems that do not make the config invalid but usually mean a
/// misconfigured project.
fn check_project(config: &IsleConfig, root: &Path) -> Vec<String> {
    let mut warnings = Vec::new();

    for (key, dir) in [
        ("routes.pages_dir", &config.routes.pages_dir),
        ("routes.api_dir", &config.routes.api_dir),
    ] {
        if !root.join(dir).is_dir() {
            warnings.push(format!("{} '{}' does not exist", key, dir));
        }
    }

    if config.routes.pages_dir == config.routes.api_dir {
        warnings.push("routes.pages_dir and routes.api_dir are the same directory".to_string());
    }

    if !config.islands.public_path.starts_with('/') {
        warnings.push(format!(
            "islands.public_path '{}' is not an absolute URL path",
            config.islands.public_path
        ));
    }

    if config.islands.threshold == 0.0 {
        warnings.push("islands.threshold 0.0 mounts islands on any visible pixel".to_string());
    }

    warnings
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("isle-cli-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_route_roots_warn() {
        let root = scratch("check-missing");
        let warnings = check_project(&IsleConfig::default(), &root);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("routes.pages_dir"));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_clean_project_has_no_warnings() {
        let root = scratch("check-clean");
        fs::create_dir_all(root.join("src/pages")).unwrap();
        fs::create_dir_all(root.join("src/api")).unwrap();
        assert!(check_project(&IsleConfig::default(), &root).is_empty());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_default_config_parses() {
        let root = scratch("default-config");
        let path = root.join(CONFIG_FILE_NAMES[0]);
        fs::write(&path, generate_default_config()).unwrap();
        assert_eq!(IsleConfig::load(&path).unwrap(), IsleConfig::default());
        fs::remove_dir_all(&root).unwrap();
    }
}
