//! Hydration errors.
//!
//! None of these escape the runtime: a failing island is logged and left
//! as static markup.

use isle_render::PropsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HydrationError {
    /// The serialized props payload could not be decoded.
    #[error("Failed to decode props of <{tag}>: {source}")]
    Decode {
        tag: String,
        #[source]
        source: PropsError,
    },

    /// The island's client module failed to load.
    #[error("Failed to load module for <{tag}>: {message}")]
    Load { tag: String, message: String },

    /// The mount routine failed.
    #[error("Failed to mount <{tag}>: {message}")]
    Mount { tag: String, message: String },

    /// The node is not an element known to the runtime.
    #[error("No island element {0}")]
    UnknownElement(String),

    /// The document could not be parsed.
    #[error("Failed to parse document: {0}")]
    Parse(String),
}

/// Result type for hydration operations.
pub type HydrationResult<T> = Result<T, HydrationError>;
