//! Route discovery from a routes root directory.

use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{RouteError, RouteResult};
use crate::source::RouteSource;

/// Options controlling which files under a routes root become routes.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Accepted file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Designators stripped from file names.
    pub markers: Vec<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            extensions: ["js", "jsx", "ts", "tsx", "rs"]
                .into_iter()
                .map(String::from)
                .collect(),
            markers: crate::source::DEFAULT_MARKERS
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DiscoverOptions {
    /// Build options from the routes section of the framework config.
    pub fn from_config(config: &isle_core::RoutesConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            markers: vec![config.page_marker.clone(), "api".to_string()],
        }
    }
}

/// Walk a routes root and parse every route file under it.
///
/// Paths are relative to `root` with `/` separators, sorted. Files and
/// directories whose name starts with `_` or `.` are skipped. A missing
/// root yields no routes.
pub fn discover(root: &Path, options: &DiscoverOptions) -> RouteResult<Vec<RouteSource>> {
    if !root.exists() {
        debug!(root = %root.display(), "Routes root does not exist");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|e| RouteError::Discovery {
            root: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let accepted = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| options.extensions.iter().any(|e| e == ext));
        if !accepted {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| RouteError::Discovery {
                root: root.to_path_buf(),
                message: e.to_string(),
            })?;
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        paths.push(relative.join("/"));
    }

    paths.sort();
    debug!(root = %root.display(), files = paths.len(), "Discovered route files");

    paths
        .iter()
        .map(|path| RouteSource::parse_with_markers(path, &options.markers))
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('_') || name.starts_with('.'))
}
