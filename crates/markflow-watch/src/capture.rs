//! The payload delivered once an image has been captured and correlated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A newly saved image, correlated (when possible) with the document that
/// caused it to be saved.
///
/// Short-lived: consumers hand it to an uploader and a rewriter, then drop
/// it. `markdown_file` is `None` when no candidate document could be
/// found, so callers can still warn the user about an orphaned image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageCapture {
    /// Absolute path of the image file.
    pub file_path: PathBuf,

    /// The image's file name.
    pub file_name: String,

    /// Path relative to the enclosing workspace root, or the absolute
    /// path when the image lies outside every root.
    pub relative_path: PathBuf,

    /// The owning document, when one could be determined.
    pub markdown_file: Option<PathBuf>,

    /// When the image file came into existence, best effort.
    pub created_time: DateTime<Utc>,
}

impl ImageCapture {
    /// Whether an owning document was found.
    pub fn is_correlated(&self) -> bool {
        self.markdown_file.is_some()
    }
}
