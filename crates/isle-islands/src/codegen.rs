//! Client unit generation.

use isle_core::IslandsConfig;
use serde::Serialize;

use crate::extract::IslandDescriptor;

/// A standalone ES module that hydrates one island call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientUnit {
    pub id: String,
    pub tag: String,
    /// File name under the islands output directory (`{tag}.js`).
    pub file_name: String,
    pub source: String,
}

/// Generates client units for island descriptors.
#[derive(Debug, Clone)]
pub struct ClientCodegen {
    runtime_module: String,
    props_attribute: String,
    threshold: f64,
}

impl Default for ClientCodegen {
    fn default() -> Self {
        Self::from_config(&IslandsConfig::default())
    }
}

impl ClientCodegen {
    pub fn from_config(config: &IslandsConfig) -> Self {
        Self {
            runtime_module: format!("{}/runtime.js", config.public_path.trim_end_matches('/')),
            props_attribute: config.props_attribute.clone(),
            threshold: config.threshold,
        }
    }

    pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
        self.runtime_module = module.into();
        self
    }

    /// Emit the client unit for one island: an import of the original
    /// implementation plus a custom-element definition bound to its tag.
    pub fn generate(&self, island: &IslandDescriptor) -> ClientUnit {
        let import = if island.export_name == "default" {
            format!("import Island from {};", js_string(&island.import_path))
        } else {
            format!(
                "import {{ {} as Island }} from {};",
                island.export_name,
                js_string(&island.import_path)
            )
        };

        let source = format!(
            "// {tag} ({location})\n\
             import {{ defineIsland }} from {runtime};\n\
             {import}\n\
             \n\
             defineIsland({tag_literal}, Island, {{\n  \
             propsAttribute: {attribute},\n  \
             threshold: {threshold},\n  \
             props: {props},\n\
             }});\n",
            tag = island.tag,
            location = island.location,
            runtime = js_string(&self.runtime_module),
            import = import,
            tag_literal = js_string(&island.tag),
            attribute = js_string(&self.props_attribute),
            threshold = self.threshold,
            props = serde_json::Value::from(island.props.clone()),
        );

        ClientUnit {
            id: island.id.clone(),
            tag: island.tag.clone(),
            file_name: format!("{}.js", island.tag),
            source,
        }
    }
}

/// Whether `name` can appear as the imported binding of a named import.
pub fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '$' || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '$' || c == '_')
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SourceLocation;

    fn descriptor(export: &str) -> IslandDescriptor {
        IslandDescriptor {
            id: "1a2b3c4d".into(),
            tag: "island-counter-1a2b3c4d".into(),
            component: "Counter".into(),
            import_path: "src/components/counter.tsx".into(),
            export_name: export.into(),
            props: vec!["count".into(), "label".into()],
            location: SourceLocation::new("src/pages/index.tsx", 4, 7),
        }
    }

    #[test]
    fn test_generate_named_export() {
        let unit = ClientCodegen::default().generate(&descriptor("Counter"));
        assert_eq!(unit.file_name, "island-counter-1a2b3c4d.js");
        assert!(unit
            .source
            .contains(r#"import { Counter as Island } from "src/components/counter.tsx";"#));
        assert!(unit.source.contains(r#"import { defineIsland } from "/islands/runtime.js";"#));
        assert!(unit.source.contains(r#"defineIsland("island-counter-1a2b3c4d", Island, {"#));
        assert!(unit.source.contains(r#"propsAttribute: "data-props","#));
        assert!(unit.source.contains("threshold: 0.2,"));
        assert!(unit.source.contains(r#"props: ["count","label"],"#));
    }

    #[test]
    fn test_generate_default_export() {
        let unit = ClientCodegen::default()
            .with_runtime_module("@isle/hydrate")
            .generate(&descriptor("default"));
        assert!(unit
            .source
            .contains(r#"import Island from "src/components/counter.tsx";"#));
        assert!(unit.source.contains(r#"from "@isle/hydrate";"#));
    }

    #[test]
    fn test_js_identifiers() {
        assert!(is_js_identifier("Counter"));
        assert!(is_js_identifier("$store_2"));
        assert!(is_js_identifier("Zähler"));
        assert!(!is_js_identifier(""));
        assert!(!is_js_identifier("2fast"));
        assert!(!is_js_identifier("a as b"));
        assert!(!is_js_identifier("X } from 'evil'; //"));
    }

    #[test]
    fn test_import_path_is_escaped() {
        let mut island = descriptor("Counter");
        island.import_path = "src/\"odd\".tsx".into();
        let unit = ClientCodegen::default().generate(&island);
        assert!(unit.source.contains(r#"from "src/\"odd\".tsx";"#));
    }
}
