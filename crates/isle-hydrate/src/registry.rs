//! Custom element definitions.

use std::collections::BTreeMap;

use tracing::debug;

/// A defined island element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDefinition {
    pub tag: String,
    /// Position in definition order.
    pub order: usize,
}

/// Registry of defined island tags.
///
/// Defining a tag a second time is a no-op, so every client unit on a page
/// can call [`ElementRegistry::define`] for its own tag without coordination.
#[derive(Debug, Default, Clone)]
pub struct ElementRegistry {
    definitions: BTreeMap<String, ElementDefinition>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a tag. Returns `false` when it was already defined.
    pub fn define(&mut self, tag: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        if self.definitions.contains_key(&tag) {
            debug!(tag = %tag, "Element already defined");
            return false;
        }
        let order = self.definitions.len();
        self.definitions
            .insert(tag.clone(), ElementDefinition { tag, order });
        true
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(&tag.to_ascii_lowercase())
    }

    pub fn get(&self, tag: &str) -> Option<&ElementDefinition> {
        self.definitions.get(&tag.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Defined tags in definition order.
    pub fn tags(&self) -> Vec<&str> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by_key(|d| d.order);
        defs.into_iter().map(|d| d.tag.as_str()).collect()
    }
}
