//! Framework configuration (`isle.toml` / `isle.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File names searched for configuration, in priority order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["isle.toml", ".isle.toml", "isle.json"];

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid config value `{key}`: {message}")]
    Invalid { key: String, message: String },
}

/// Top-level framework configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsleConfig {
    /// Route discovery and compilation settings.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Island extraction and hydration settings.
    #[serde(default)]
    pub islands: IslandsConfig,

    /// Document shell settings.
    #[serde(default)]
    pub render: RenderConfig,
}

impl IsleConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Find the nearest config file from `start` upward.
    pub fn find(start: impl AsRef<Path>) -> Option<PathBuf> {
        let mut current = start.as_ref().to_path_buf();
        loop {
            for name in CONFIG_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            key: "<root>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate value ranges and naming rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.islands.threshold) {
            return Err(ConfigError::Invalid {
                key: "islands.threshold".to_string(),
                message: format!("{} is outside 0.0..=1.0", self.islands.threshold),
            });
        }

        let prefix = &self.islands.tag_prefix;
        let valid_prefix = prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
            && prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_prefix {
            return Err(ConfigError::Invalid {
                key: "islands.tag_prefix".to_string(),
                message: format!("`{}` must be a lowercase ASCII identifier", prefix),
            });
        }

        if !self.routes.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid {
                key: "routes.api_prefix".to_string(),
                message: format!("`{}` must start with `/`", self.routes.api_prefix),
            });
        }

        if self.routes.extensions.is_empty() {
            return Err(ConfigError::Invalid {
                key: "routes.extensions".to_string(),
                message: "at least one extension is required".to_string(),
            });
        }

        Ok(())
    }

    /// Set the pages routes root.
    pub fn with_pages_dir(mut self, dir: impl Into<String>) -> Self {
        self.routes.pages_dir = dir.into();
        self
    }

    /// Set the API routes root.
    pub fn with_api_dir(mut self, dir: impl Into<String>) -> Self {
        self.routes.api_dir = dir.into();
        self
    }

    /// Set the island custom-element prefix.
    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.islands.tag_prefix = prefix.into();
        self
    }

    /// Set the visibility threshold that triggers island mounting.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.islands.threshold = threshold;
        self
    }

    /// Set the default document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.render.title = title.into();
        self
    }
}

/// Route discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Routes root for pages.
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    /// Routes root for API handlers.
    #[serde(default = "default_api_dir")]
    pub api_dir: String,

    /// URL prefix for API routes.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Trailing designator stripped from page file names (`about.page.tsx`).
    #[serde(default = "default_page_marker")]
    pub page_marker: String,

    /// Source file extensions recognized as routes.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_pages_dir() -> String {
    "src/pages".to_string()
}

fn default_api_dir() -> String {
    "src/api".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_page_marker() -> String {
    "page".to_string()
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx", "rs"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
            api_dir: default_api_dir(),
            api_prefix: default_api_prefix(),
            page_marker: default_page_marker(),
            extensions: default_extensions(),
        }
    }
}

/// Island extraction and hydration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandsConfig {
    /// Custom-element prefix (`island` gives `<island-counter-...>`).
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Attribute carrying the serialized props.
    #[serde(default = "default_props_attribute")]
    pub props_attribute: String,

    /// Intersection ratio that triggers mounting.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Output directory for generated client units.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// URL prefix under which client units are served.
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

fn default_tag_prefix() -> String {
    "island".to_string()
}

fn default_props_attribute() -> String {
    "data-props".to_string()
}

fn default_threshold() -> f64 {
    0.2
}

fn default_out_dir() -> String {
    ".islands".to_string()
}

fn default_public_path() -> String {
    "/islands".to_string()
}

impl Default for IslandsConfig {
    fn default() -> Self {
        Self {
            tag_prefix: default_tag_prefix(),
            props_attribute: default_props_attribute(),
            threshold: default_threshold(),
            out_dir: default_out_dir(),
            public_path: default_public_path(),
        }
    }
}

/// Document shell settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// `lang` attribute of the document.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Default page title.
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_title() -> String {
    "Isle".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            title: default_title(),
        }
    }
}

/// Generate a default `isle.toml`.
pub fn generate_default_config() -> String {
    r#"# Isle configuration

[routes]
pages_dir = "src/pages"
api_dir = "src/api"
api_prefix = "/api"
page_marker = "page"
extensions = ["js", "jsx", "ts", "tsx", "rs"]

[islands]
tag_prefix = "island"
props_attribute = "data-props"
threshold = 0.2
out_dir = ".islands"
public_path = "/islands"

[render]
lang = "en"
title = "Isle"
"#
    .to_string()
}
