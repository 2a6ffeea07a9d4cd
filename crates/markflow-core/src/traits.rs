//! Capability seams between the engine and its host environment.
//!
//! The engine never talks to an editor directly: everything it needs from
//! the outside world — workspace lookup, the set of open documents, text
//! edits, uploads — comes in through these traits so hosts and tests can
//! supply their own implementations.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::position::Position;
use crate::rewrite::RewriteEdit;

/// Maps a path to the workspace root that encloses it, if any.
pub trait WorkspaceResolver: Send + Sync {
    /// The enclosing workspace root of `path`, or `None` when the path
    /// lies outside every known root.
    fn workspace_folder(&self, path: &Path) -> Option<PathBuf>;

    /// All known workspace roots.
    fn roots(&self) -> Vec<PathBuf>;
}

/// Access to the host's documents.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// The currently focused document, if any.
    async fn focused_document(&self) -> Option<PathBuf>;

    /// Every open document, most recently opened first.
    async fn open_documents(&self) -> Vec<PathBuf>;

    /// Read a document's full text.
    async fn read_document(&self, path: &Path) -> Result<String>;

    /// Apply a text replacement to a document and persist it, returning
    /// the cursor position after the edit, clamped to the document's
    /// current bounds.
    async fn apply_edit(&self, path: &Path, edit: &RewriteEdit) -> Result<Position>;
}

/// An external upload capability. Backend implementations are the host's
/// concern; the engine only needs the resulting remote URL.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Human-readable provider name, used in logs and outcomes.
    fn name(&self) -> &str;

    /// Whether the uploader has everything it needs to operate.
    fn is_configured(&self) -> bool {
        true
    }

    /// Upload the file and return its remote URL.
    async fn upload(&self, path: &Path) -> Result<String>;
}
