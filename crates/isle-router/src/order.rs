//! Specificity ordering between compiled routes.
//!
//! The order is first-match-wins critical: the route table tries patterns
//! in this order and stops at the first structural match.
//!
//! 1. Non-catch-all routes before catch-all routes.
//! 2. Fewer dynamic segments first.
//! 3. Fewer total segments first.
//! 4. Walking from the root, static before dynamic at the first differing
//!    position.
//! 5. At a position where both are dynamic, more parameters first
//!    (`$a-$b` before `$a`), then more literal text first (`post-$slug`
//!    before `$a`).
//! 6. Remaining ties are broken by the source path so the order is total.

use std::cmp::Ordering;

use serde::Serialize;

use crate::source::{RouteSource, Segment};

/// Per-segment sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SegmentRank {
    Static,
    Dynamic { params: usize, literal_len: usize },
}

impl SegmentRank {
    fn of(segment: &Segment) -> Self {
        if segment.is_dynamic() {
            Self::Dynamic {
                params: segment.param_count(),
                literal_len: segment.literal_len(),
            }
        } else {
            Self::Static
        }
    }
}

impl Ord for SegmentRank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Static, Self::Static) => Ordering::Equal,
            (Self::Static, Self::Dynamic { .. }) => Ordering::Less,
            (Self::Dynamic { .. }, Self::Static) => Ordering::Greater,
            // More parameters or more literal text constrain the raw text further.
            (
                Self::Dynamic {
                    params: a,
                    literal_len: a_len,
                },
                Self::Dynamic {
                    params: b,
                    literal_len: b_len,
                },
            ) => b.cmp(a).then_with(|| b_len.cmp(a_len)),
        }
    }
}

impl PartialOrd for SegmentRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Structural sort key of a route. Field order is comparison order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SpecificityRank {
    /// Route ends in a catch-all segment.
    pub catch_all: bool,
    /// Number of dynamic and catch-all segments.
    pub dynamic_segments: usize,
    /// Number of segments, prefix included.
    pub total_segments: usize,
    /// Per-position keys from the root.
    pub shape: Vec<SegmentRank>,
}

impl SpecificityRank {
    /// Compute the rank of a full segment list.
    pub fn of(segments: &[Segment]) -> Self {
        Self {
            catch_all: segments
                .last()
                .is_some_and(|s| s.kind == crate::source::SegmentKind::CatchAll),
            dynamic_segments: segments.iter().filter(|s| s.is_dynamic()).count(),
            total_segments: segments.len(),
            shape: segments.iter().map(SegmentRank::of).collect(),
        }
    }

    /// Compute the rank of a route source without a prefix.
    pub fn of_source(source: &RouteSource) -> Self {
        Self::of(&source.segments)
    }
}

/// Compare two route sources. `Ordering::Less` means `a` is tried first.
pub fn compare_sources(a: &RouteSource, b: &RouteSource) -> Ordering {
    SpecificityRank::of_source(a)
        .cmp(&SpecificityRank::of_source(b))
        .then_with(|| a.raw.cmp(&b.raw))
}
