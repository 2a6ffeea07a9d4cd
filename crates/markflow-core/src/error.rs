//! Error types for the core engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading or writing a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not available to the host.
    #[error("document '{0}' is not available")]
    DocumentUnavailable(PathBuf),

    /// No image reference matching the given local path was found.
    #[error("no image reference matching '{0}' found in document")]
    ReferenceNotFound(String),

    /// An upload capability reported a failure.
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
