//! Island extraction over serialized component trees.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use isle_islands::{
    write_client_units, write_manifest, Extraction, IslandExtractor, IslandManifest, Node,
};

use super::IslandsArgs;
use crate::context::Context;

/// Run the islands command.
pub async fn run(args: IslandsArgs, ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let out_dir = match &args.out {
        Some(out) => ctx.resolve_path(out),
        None => ctx.project_root().join(&config.islands.out_dir),
    };

    let extractor = IslandExtractor::from_config(&config.islands);
    let mut manifest = IslandManifest::new();
    let progress = ctx.output.progress(args.trees.len() as u64, "Extracting islands");

    for tree in &args.trees {
        let path = ctx.resolve_path(tree);
        progress.set_message(tree.clone());

        let extraction = extract_file(&extractor, &path)?;
        let units = write_client_units(&extraction, &out_dir)?;
        let server_tree = write_server_tree(&extraction, &path, &out_dir)?;
        manifest.record(&extraction, &config.islands.public_path);

        ctx.output.debug(&format!(
            "{}: {} island(s), server tree {}",
            path.display(),
            extraction.islands.len(),
            server_tree.display()
        ));
        for unit in units {
            ctx.output.debug(&format!("  wrote {}", unit.display()));
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let manifest_path = write_manifest(&manifest, &out_dir)?;

    if ctx.output.is_json() {
        ctx.output.json(&manifest);
        return Ok(());
    }

    ctx.output.success(&format!(
        "Extracted {} island(s) from {} tree(s)",
        manifest.islands.len(),
        args.trees.len()
    ));
    for entry in manifest.islands.values() {
        ctx.output.list_item(&format!(
            "<{}> {}#{} → {}",
            entry.tag, entry.import_path, entry.export_name, entry.client_path
        ));
    }
    ctx.output.kv("manifest", &manifest_path.display().to_string());
    Ok(())
}

fn extract_file(extractor: &IslandExtractor, path: &Path) -> Result<Extraction> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read component tree {}", path.display()))?;
    let tree: Node = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse component tree {}", path.display()))?;
    extractor
        .extract(&tree)
        .with_context(|| format!("Failed to extract islands from {}", path.display()))
}

/// Write the rewritten tree as `{stem}.server.json` next to the client units.
fn write_server_tree(extraction: &Extraction, source: &Path, out_dir: &Path) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("tree");
    let path = out_dir.join(format!("{}.server.json", stem));
    let json = serde_json::to_string_pretty(&extraction.server_tree)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_islands::ComponentCall;
    use serde_json::json;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("isle-cli-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_extract_file_and_write_server_tree() {
        let dir = scratch("islands");
        let tree: Node = ComponentCall::new("CounterIsland")
            .with_import("src/islands/counter.tsx", "Counter")
            .with_prop("count", json!(1))
            .at("src/pages/index.tsx", 4, 3)
            .into();
        let source = dir.join("index.json");
        fs::write(&source, serde_json::to_string(&tree).unwrap()).unwrap();

        let extraction = extract_file(&IslandExtractor::new(), &source).unwrap();
        assert_eq!(extraction.islands.len(), 1);

        let out = dir.join("out");
        fs::create_dir_all(&out).unwrap();
        let written = write_server_tree(&extraction, &source, &out).unwrap();
        assert_eq!(written, out.join("index.server.json"));
        let back: Node = serde_json::from_str(&fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(back, extraction.server_tree);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_tree_names_the_file() {
        let dir = scratch("malformed");
        let source = dir.join("broken.json");
        fs::write(&source, "{ not json").unwrap();

        let err = extract_file(&IslandExtractor::new(), &source).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
