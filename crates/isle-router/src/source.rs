//! Route source files and segment classification.

use serde::Serialize;

use crate::error::{RouteError, RouteResult};

/// Marker introducing a dynamic parameter (`$id`).
pub const DYNAMIC_MARKER: char = '$';

/// Marker introducing a catch-all parameter (`$$rest`).
pub const CATCH_ALL_MARKER: &str = "$$";

/// File stem that maps to its parent path.
pub const INDEX_SEGMENT: &str = "index";

/// Trailing designators stripped from file names by default.
pub const DEFAULT_MARKERS: [&str; 2] = ["page", "api"];

/// Kind of a single path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    /// Matches its literal text.
    Static,
    /// Matches exactly one path segment; may hold several parameters
    /// separated by literals (`$a-$b`).
    Dynamic,
    /// Consumes every remaining path segment into one parameter.
    CatchAll,
}

/// A piece of a dynamic segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum SegmentPart {
    Literal(String),
    Param(String),
}

/// One classified path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Segment {
    /// Raw text as written in the file path.
    pub raw: String,
    /// Classification.
    pub kind: SegmentKind,
    /// Literal/parameter breakdown. Static segments hold one literal.
    pub parts: Vec<SegmentPart>,
}

impl Segment {
    /// Classify a single path component.
    pub fn parse(raw: &str, path: &str) -> RouteResult<Self> {
        let malformed = |reason: &str| RouteError::MalformedSegment {
            path: path.to_string(),
            segment: raw.to_string(),
            reason: reason.to_string(),
        };

        if let Some(name) = raw.strip_prefix(CATCH_ALL_MARKER) {
            if !is_identifier(name) {
                return Err(malformed("catch-all marker must be followed by a parameter name"));
            }
            return Ok(Self {
                raw: raw.to_string(),
                kind: SegmentKind::CatchAll,
                parts: vec![SegmentPart::Param(name.to_string())],
            });
        }

        if !raw.contains(DYNAMIC_MARKER) {
            return Ok(Self::literal(raw));
        }

        if raw.contains(CATCH_ALL_MARKER) {
            return Err(malformed("catch-all marker must start the segment"));
        }

        let mut parts = Vec::new();
        let mut rest = raw;
        while !rest.is_empty() {
            match rest.find(DYNAMIC_MARKER) {
                Some(0) => {
                    let after = &rest[1..];
                    let len = after
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(after.len());
                    let name = &after[..len];
                    if !is_identifier(name) {
                        return Err(malformed("`$` must be followed by a parameter name"));
                    }
                    if matches!(parts.last(), Some(SegmentPart::Param(_))) {
                        return Err(malformed("parameters must be separated by a literal"));
                    }
                    parts.push(SegmentPart::Param(name.to_string()));
                    rest = &after[len..];
                }
                Some(idx) => {
                    parts.push(SegmentPart::Literal(rest[..idx].to_string()));
                    rest = &rest[idx..];
                }
                None => {
                    parts.push(SegmentPart::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            kind: SegmentKind::Dynamic,
            parts,
        })
    }

    /// Build a static segment.
    pub fn literal(text: &str) -> Self {
        Self {
            raw: text.to_string(),
            kind: SegmentKind::Static,
            parts: vec![SegmentPart::Literal(text.to_string())],
        }
    }

    /// Whether this segment captures anything.
    pub fn is_dynamic(&self) -> bool {
        self.kind != SegmentKind::Static
    }

    /// Number of parameters declared by this segment.
    pub fn param_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, SegmentPart::Param(_)))
            .count()
    }

    /// Bytes of literal text around the parameters of a dynamic segment.
    pub fn literal_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match p {
                SegmentPart::Literal(text) => text.len(),
                SegmentPart::Param(_) => 0,
            })
            .sum()
    }

    /// Parameter names declared by this segment, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            SegmentPart::Param(name) => Some(name.as_str()),
            SegmentPart::Literal(_) => None,
        })
    }

    /// Render in normalized route-path form (`:id`, `*`).
    pub fn route_path(&self) -> String {
        match self.kind {
            SegmentKind::Static => self.raw.clone(),
            SegmentKind::CatchAll => "*".to_string(),
            SegmentKind::Dynamic => self
                .parts
                .iter()
                .map(|p| match p {
                    SegmentPart::Literal(text) => text.clone(),
                    SegmentPart::Param(name) => format!(":{}", name),
                })
                .collect(),
        }
    }
}

/// A route file path under a routes root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSource {
    /// Path as given, relative to the routes root.
    pub raw: String,
    /// File extension, when present.
    pub extension: Option<String>,
    /// Classified path components, without the index segment.
    pub segments: Vec<Segment>,
    /// Whether the file is an `index` route (maps to its parent path).
    pub index: bool,
}

impl RouteSource {
    /// Parse a path with the default designators (`page`, `api`).
    pub fn parse(path: &str) -> RouteResult<Self> {
        Self::parse_with_markers(path, &DEFAULT_MARKERS)
    }

    /// Parse a path, stripping the extension and any of `markers` from the
    /// final component before classifying segments.
    pub fn parse_with_markers<S: AsRef<str>>(path: &str, markers: &[S]) -> RouteResult<Self> {
        let normalized = path.replace('\\', "/");
        let trimmed = normalized.trim_start_matches("./").trim_matches('/');

        let mut components: Vec<&str> = trimmed.split('/').filter(|c| !c.is_empty()).collect();
        let mut extension = None;
        let mut last = String::new();

        if let Some(file) = components.pop() {
            let (stem, ext) = split_extension(file);
            extension = ext.map(String::from);
            last = strip_marker(stem, markers).to_string();
        }

        let index = last == INDEX_SEGMENT;
        let mut segments = Vec::with_capacity(components.len() + 1);
        for component in components {
            segments.push(Segment::parse(component, path)?);
        }
        if !index && !last.is_empty() {
            segments.push(Segment::parse(&last, path)?);
        }

        if let Some(pos) = segments.iter().position(|s| s.kind == SegmentKind::CatchAll) {
            if pos + 1 != segments.len() {
                return Err(RouteError::CatchAllNotLast {
                    path: path.to_string(),
                    segment: segments[pos].raw.clone(),
                });
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for name in segments.iter().flat_map(|s| s.param_names()) {
            if seen.contains(&name) {
                return Err(RouteError::DuplicateParam {
                    path: path.to_string(),
                    name: name.to_string(),
                });
            }
            seen.push(name);
        }

        Ok(Self {
            raw: path.to_string(),
            extension,
            segments,
            index,
        })
    }

    /// Whether the route ends in a catch-all segment.
    pub fn is_catch_all(&self) -> bool {
        self.segments
            .last()
            .is_some_and(|s| s.kind == SegmentKind::CatchAll)
    }

    /// Number of dynamic (including catch-all) segments.
    pub fn dynamic_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_dynamic()).count()
    }
}

fn split_extension(file: &str) -> (&str, Option<&str>) {
    match file.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext))
        }
        _ => (file, None),
    }
}

fn strip_marker<'a, S: AsRef<str>>(stem: &'a str, markers: &[S]) -> &'a str {
    for marker in markers {
        let marker: &str = marker.as_ref();
        if let Some(stripped) = stem
            .strip_suffix(marker)
            .and_then(|s| s.strip_suffix('.'))
        {
            if !stripped.is_empty() {
                return stripped;
            }
        }
    }
    stem
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
