//! Error types for request dispatch.

use http::StatusCode;
use isle_core::ConfigError;
use isle_islands::ExtractError;
use isle_render::RenderError;
use isle_router::{LoadError, RouteError};
use thiserror::Error;

/// Error returned by user-supplied page loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building an app or dispatching a request.
#[derive(Error, Debug)]
pub enum IsleError {
    /// A route file failed to compile or a routes root could not be read.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Invalid framework configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The island manifest could not be read.
    #[error(transparent)]
    Manifest(#[from] ExtractError),

    /// A discovered route file has no module bound to it.
    #[error("No module registered for route file {path}")]
    UnresolvedRoute { path: String },

    /// The route's module failed to load.
    #[error(transparent)]
    ModuleLoad(#[from] LoadError),

    /// A page's data loader failed.
    #[error("Loader of {route} failed for {url}: {source}")]
    Loader {
        route: String,
        url: String,
        #[source]
        source: BoxError,
    },

    /// The page tree could not be rendered.
    #[error("Failed to render {route}: {source}")]
    Render {
        route: String,
        #[source]
        source: RenderError,
    },
}

impl IsleError {
    /// HTTP status for a request that failed with this error.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Whether the error happened at startup rather than during a request.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Route(_) | Self::Config(_) | Self::Manifest(_) | Self::UnresolvedRoute { .. }
        )
    }
}

/// Result type for dispatch operations.
pub type IsleResult<T> = Result<T, IsleError>;
