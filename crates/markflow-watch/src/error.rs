//! Error types for the capture watcher.
//!
//! Deliberately small: transient conditions (unstable files, missing
//! candidates, rejected patterns) are absorbed where they occur and
//! reported as outcomes rather than errors, so only service-level
//! failures remain.

use thiserror::Error;

/// Errors that can occur while watching for captures.
#[derive(Debug, Error)]
pub enum Error {
    /// File system watching error.
    #[error("File watching error: {0}")]
    Watch(String),

    /// Capture is disabled in the configuration snapshot.
    #[error("capture is disabled by configuration")]
    Disabled,

    /// The service is already running.
    #[error("capture service is already running")]
    AlreadyRunning,
}

/// Result type for capture watching operations.
pub type Result<T> = std::result::Result<T, Error>;
