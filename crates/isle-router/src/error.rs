//! Route compilation errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while compiling or discovering routes.
///
/// All of these are configuration errors: they surface at build or startup
/// time and never while matching a request.
#[derive(Error, Debug)]
pub enum RouteError {
    /// A path segment has an invalid marker combination.
    #[error("Malformed route segment `{segment}` in {path}: {reason}")]
    MalformedSegment {
        path: String,
        segment: String,
        reason: String,
    },

    /// A catch-all segment is followed by more segments.
    #[error("Catch-all segment `{segment}` must be the last segment in {path}")]
    CatchAllNotLast { path: String, segment: String },

    /// The same parameter name is declared twice.
    #[error("Duplicate route parameter `{name}` in {path}")]
    DuplicateParam { path: String, name: String },

    /// The generated expression failed to compile.
    #[error("Invalid route pattern for {path}: {message}")]
    InvalidPattern { path: String, message: String },

    /// A routes root could not be walked.
    #[error("Failed to scan routes root {root}: {message}")]
    Discovery { root: PathBuf, message: String },
}

/// Result alias for route operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Error returned by a deferred module loader.
#[derive(Error, Debug, Clone)]
#[error("Failed to load module for route {route}: {message}")]
pub struct LoadError {
    /// Route id whose module failed to load.
    pub route: String,
    /// Loader-provided description.
    pub message: String,
}

impl LoadError {
    /// Create a new load error.
    pub fn new(route: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            message: message.into(),
        }
    }
}
