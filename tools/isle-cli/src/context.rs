//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use isle_core::IsleConfig;

use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    /// Config file in use, if any was given or found.
    pub config_path: Option<PathBuf>,
}

impl Context {
    /// Locate the config file. It is parsed on demand so that `config init`
    /// and `config validate` still run against a broken file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config_path = match config_path {
            Some(path) => Some(resolve(&cwd, path)),
            None => IsleConfig::find(&cwd),
        };
        if let Some(path) = &config_path {
            output.debug(&format!("Using config {}", path.display()));
        }

        Ok(Self {
            output,
            cwd,
            config_path,
        })
    }

    /// Parse and validate the config, or fall back to defaults when no
    /// config file exists.
    pub fn config(&self) -> Result<IsleConfig> {
        match &self.config_path {
            Some(path) => IsleConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            None => Ok(IsleConfig::default()),
        }
    }

    /// Directory route roots and output paths are relative to: the config
    /// file's directory, else the working directory.
    pub fn project_root(&self) -> PathBuf {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone())
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve(&self.cwd, path)
    }
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
