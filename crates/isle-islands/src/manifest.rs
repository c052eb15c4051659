//! Island build manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ExtractError, ExtractResult};
use crate::extract::Extraction;

/// Manifest file name written next to the client units.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One island as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub tag: String,
    pub import_path: String,
    pub export_name: String,
    pub props: Vec<String>,
    /// URL of the client unit (`/islands/island-counter-1a2b3c4d.js`).
    pub client_path: String,
}

/// Island id → client unit mapping produced by a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandManifest {
    pub generated_at: DateTime<Utc>,
    pub islands: BTreeMap<String, ManifestEntry>,
}

impl Default for IslandManifest {
    fn default() -> Self {
        Self {
            generated_at: Utc::now(),
            islands: BTreeMap::new(),
        }
    }
}

impl IslandManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every island of an extraction. Client paths are `public_path`
    /// joined with the unit's file name.
    pub fn record(&mut self, extraction: &Extraction, public_path: &str) {
        let base = public_path.trim_end_matches('/');
        for island in &extraction.islands {
            let file_name = extraction
                .client_modules
                .get(&island.id)
                .map(|unit| unit.file_name.clone())
                .unwrap_or_else(|| format!("{}.js", island.tag));
            self.islands.insert(
                island.id.clone(),
                ManifestEntry {
                    tag: island.tag.clone(),
                    import_path: island.import_path.clone(),
                    export_name: island.export_name.clone(),
                    props: island.props.clone(),
                    client_path: format!("{}/{}", base, file_name),
                },
            );
        }
        self.generated_at = Utc::now();
    }

    /// Entry of an island by id.
    pub fn get(&self, id: &str) -> Option<&ManifestEntry> {
        self.islands.get(id)
    }

    /// Client unit URL of an island by id.
    pub fn client_path(&self, id: &str) -> Option<&str> {
        self.islands.get(id).map(|e| e.client_path.as_str())
    }

    pub fn to_json(&self) -> ExtractResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ExtractResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load `manifest.json` from an output directory.
    pub fn load(dir: &Path) -> ExtractResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        let json = fs::read_to_string(&path).map_err(|source| ExtractError::Io { path, source })?;
        Self::from_json(&json)
    }
}

/// Write the client units of an extraction into `out_dir`, returning the
/// paths written.
pub fn write_client_units(extraction: &Extraction, out_dir: &Path) -> ExtractResult<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|source| ExtractError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(extraction.client_modules.len());
    for unit in extraction.client_modules.values() {
        let path = out_dir.join(&unit.file_name);
        fs::write(&path, &unit.source).map_err(|source| ExtractError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

/// Write a manifest as `manifest.json` in `out_dir`.
pub fn write_manifest(manifest: &IslandManifest, out_dir: &Path) -> ExtractResult<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|source| ExtractError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let path = out_dir.join(MANIFEST_FILE);
    fs::write(&path, manifest.to_json()?).map_err(|source| ExtractError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), islands = manifest.islands.len(), "Wrote island manifest");
    Ok(path)
}
