//! Render errors.

use thiserror::Error;

/// Errors raised while rendering a tree.
#[derive(Error, Debug)]
pub enum RenderError {
    /// An island prop cannot cross the server/client boundary.
    #[error("Prop `{prop}` of island `{component}` is not JSON-serializable: {reason}")]
    NonSerializableProp {
        component: String,
        prop: String,
        reason: String,
    },

    /// A component call has no registered implementation.
    #[error("Unknown component `{0}`")]
    UnknownComponent(String),

    /// Component expansion nested deeper than the renderer allows.
    #[error("Component `{component}` exceeded the maximum render depth of {limit}")]
    DepthExceeded { component: String, limit: usize },

    /// A component implementation failed.
    #[error("Component `{component}` failed: {message}")]
    Component { component: String, message: String },

    /// A tag or attribute name would break out of the markup.
    #[error("Invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },

    /// Props could not be encoded.
    #[error("Failed to encode props: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result alias for rendering.
pub type RenderResult<T> = Result<T, RenderError>;
