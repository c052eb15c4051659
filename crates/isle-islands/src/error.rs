//! Island extraction errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::tree::SourceLocation;

/// Errors raised at build time by island extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Two call sites hashed to the same island id.
    #[error("Island id `{id}` is shared by {first} and {second}")]
    DuplicateIsland {
        id: String,
        first: SourceLocation,
        second: SourceLocation,
    },

    /// The tag prefix would not produce a valid custom-element name.
    #[error("Invalid island tag prefix `{0}`")]
    InvalidTagPrefix(String),

    /// Writing client units or the manifest failed.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest (de)serialization failed.
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Result alias for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;
