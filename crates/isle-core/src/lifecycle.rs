//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Request received, processing started.
    Start,
    /// A route matched; carries the route id.
    RouteMatched(String),
    /// The page data loader finished.
    DataLoaded,
    /// The page body has been rendered to HTML.
    Rendered,
    /// Request completed successfully.
    Completion,
    /// An error occurred.
    Error(String),
}

impl LifecyclePhase {
    /// Timing mark name recorded for this phase.
    pub fn mark_name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::RouteMatched(_) => "route_matched",
            Self::DataLoaded => "data_loaded",
            Self::Rendered => "rendered",
            Self::Completion => "complete",
            Self::Error(_) => "error",
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Record the mark for a lifecycle phase.
    pub fn mark_phase(&mut self, phase: &LifecyclePhase) {
        self.mark(phase.mark_name());
    }

    /// Time from start to a recorded mark.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Whether a mark has been recorded.
    pub fn has_mark(&self, name: &str) -> bool {
        self.marks.contains_key(name)
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time spent in the page data loader, if one ran.
    pub fn loader_time(&self) -> Option<Duration> {
        let matched = self.marks.get("route_matched")?;
        let loaded = self.marks.get("data_loaded")?;
        Some(loaded.duration_since(*matched))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}
