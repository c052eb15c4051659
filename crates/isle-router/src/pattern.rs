//! Route pattern compilation.

use std::cmp::Ordering;
use std::fmt;

use isle_core::RouteParams;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;

use crate::error::{RouteError, RouteResult};
use crate::order::SpecificityRank;
use crate::source::{RouteSource, Segment, SegmentKind, SegmentPart, DEFAULT_MARKERS};

/// Compiles route source paths into [`RoutePattern`]s.
///
/// A compiler carries the URL prefix of its routes root (empty for pages,
/// `/api` for API handlers) and the designators stripped from file names.
#[derive(Debug, Clone)]
pub struct PatternCompiler {
    prefix: Vec<Segment>,
    markers: Vec<String>,
}

impl Default for PatternCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternCompiler {
    /// Create a compiler with no prefix and the default designators.
    pub fn new() -> Self {
        Self {
            prefix: Vec::new(),
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Mount every compiled route under a static URL prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::literal)
            .collect();
        self
    }

    /// Replace the designators stripped from file names.
    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Designators stripped from file names.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Compile a route file path.
    pub fn compile(&self, path: &str) -> RouteResult<RoutePattern> {
        let source = RouteSource::parse_with_markers(path, &self.markers)?;
        self.compile_source(source)
    }

    /// Compile an already-parsed route source.
    pub fn compile_source(&self, source: RouteSource) -> RouteResult<RoutePattern> {
        let segments: Vec<Segment> = self
            .prefix
            .iter()
            .cloned()
            .chain(source.segments.iter().cloned())
            .collect();

        let mut expr = String::from("^");
        for segment in &segments {
            match segment.kind {
                SegmentKind::Static => {
                    expr.push('/');
                    expr.push_str(&regex::escape(&segment.raw));
                }
                SegmentKind::Dynamic => {
                    expr.push('/');
                    for part in &segment.parts {
                        match part {
                            SegmentPart::Literal(text) => expr.push_str(&regex::escape(text)),
                            SegmentPart::Param(_) => expr.push_str("([^/]+?)"),
                        }
                    }
                }
                // Optional so that the bare parent path matches with the
                // parameter absent.
                SegmentKind::CatchAll => expr.push_str("(?:/(.+?))?"),
            }
        }
        expr.push_str("/?$");

        let regex = Regex::new(&expr).map_err(|e| RouteError::InvalidPattern {
            path: source.raw.clone(),
            message: e.to_string(),
        })?;

        let param_names: Vec<String> = segments
            .iter()
            .flat_map(|s| s.param_names())
            .map(String::from)
            .collect();

        let mut route_path: String = segments
            .iter()
            .map(|s| format!("/{}", s.route_path()))
            .collect();
        if route_path.is_empty() || (source.index && !route_path.ends_with('/')) {
            route_path.push('/');
        }

        let rank = SpecificityRank::of(&segments);

        debug!(
            source = %source.raw,
            route_path = %route_path,
            pattern = %regex.as_str(),
            "Compiled route"
        );

        Ok(RoutePattern {
            source,
            route_path,
            regex,
            param_names,
            rank,
        })
    }
}

/// Compile a route file path with a default [`PatternCompiler`].
pub fn compile(path: &str) -> RouteResult<RoutePattern> {
    PatternCompiler::new().compile(path)
}

/// A compiled route pattern. Immutable once built.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: RouteSource,
    route_path: String,
    regex: Regex,
    param_names: Vec<String>,
    rank: SpecificityRank,
}

impl RoutePattern {
    /// The route source this pattern was compiled from.
    pub fn source(&self) -> &RouteSource {
        &self.source
    }

    /// Normalized route path (`/blog/:id`, `/docs/*`).
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    /// Source text of the matching expression.
    pub fn pattern_source(&self) -> &str {
        self.regex.as_str()
    }

    /// Parameter names by capture-group position.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Specificity rank.
    pub fn rank(&self) -> &SpecificityRank {
        &self.rank
    }

    /// Whether the pattern ends in a catch-all segment.
    pub fn is_catch_all(&self) -> bool {
        self.rank.catch_all
    }

    /// Match a request path (no query string). Captures are percent-decoded;
    /// a group that did not participate yields an absent parameter.
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let captures = self.regex.captures(path)?;
        let mut params = RouteParams::new();
        for (idx, name) in self.param_names.iter().enumerate() {
            let value = captures
                .get(idx + 1)
                .map(|m| percent_decode_str(m.as_str()).decode_utf8_lossy().into_owned());
            params.insert(name.clone(), value);
        }
        Some(params)
    }

    /// Whether a request path matches structurally.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Total match order: specificity rank, then source path.
    pub fn cmp_specificity(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.source.raw.cmp(&other.source.raw))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.route_path, self.source.raw)
    }
}
