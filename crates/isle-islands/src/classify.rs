//! Island classification.
//!
//! Deciding which call sites are islands is a project convention, so the
//! extractor takes the predicate as a trait object.

use crate::tree::ComponentCall;

/// Decides whether a component call site is an island.
pub trait IslandClassifier: Send + Sync {
    fn is_island(&self, call: &ComponentCall) -> bool;
}

impl<F> IslandClassifier for F
where
    F: Fn(&ComponentCall) -> bool + Send + Sync,
{
    fn is_island(&self, call: &ComponentCall) -> bool {
        self(call)
    }
}

/// Components whose name ends with a suffix (`FormIsland`).
#[derive(Debug, Clone)]
pub struct NameSuffix(pub String);

impl Default for NameSuffix {
    fn default() -> Self {
        Self("Island".to_string())
    }
}

impl IslandClassifier for NameSuffix {
    fn is_island(&self, call: &ComponentCall) -> bool {
        call.name.len() > self.0.len() && call.name.ends_with(&self.0)
    }
}

/// Components imported from a directory (`src/islands/`).
#[derive(Debug, Clone)]
pub struct ImportDir(pub String);

impl IslandClassifier for ImportDir {
    fn is_island(&self, call: &ComponentCall) -> bool {
        let dir = self.0.trim_end_matches('/');
        call.import.as_ref().is_some_and(|import| {
            import
                .path
                .trim_start_matches("./")
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// Matches when any inner classifier matches.
#[derive(Default)]
pub struct AnyOf(Vec<Box<dyn IslandClassifier>>);

impl AnyOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, classifier: impl IslandClassifier + 'static) -> Self {
        self.0.push(Box::new(classifier));
        self
    }
}

impl IslandClassifier for AnyOf {
    fn is_island(&self, call: &ComponentCall) -> bool {
        self.0.iter().any(|c| c.is_island(call))
    }
}
