//! Headless implementations of the host-capability traits.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::paths;
use crate::position::Position;
use crate::rewrite::{self, RewriteEdit};
use crate::traits::{DocumentHost, WorkspaceResolver};

/// A workspace resolver over a fixed list of roots.
#[derive(Debug, Clone)]
pub struct StaticWorkspace {
    roots: Vec<PathBuf>,
}

impl StaticWorkspace {
    /// Create a resolver for the given roots.
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().map(|r| paths::normalize(&r)).collect(),
        }
    }
}

impl WorkspaceResolver for StaticWorkspace {
    fn workspace_folder(&self, path: &Path) -> Option<PathBuf> {
        let path = paths::normalize(path);
        // The longest containing root wins so nested roots behave.
        self.roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
    }

    fn roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }
}

#[derive(Debug, Default)]
struct HostState {
    /// Open documents, most recently opened first.
    open: Vec<PathBuf>,
    focused: Option<PathBuf>,
}

/// A filesystem-backed document host.
///
/// Documents live on disk; which ones are "open" and which one is
/// "focused" is explicit state the caller maintains, which is all the
/// correlator needs to run headless (and tests need to steer decisions).
#[derive(Debug, Default)]
pub struct FsDocumentHost {
    state: RwLock<HostState>,
}

impl FsDocumentHost {
    /// Create a host with no open documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a document as open, moving it to the front of the recency
    /// order.
    pub async fn open_document(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state.write().await;
        state.open.retain(|p| *p != path);
        state.open.insert(0, path);
    }

    /// Mark a document as open and focused.
    pub async fn focus(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.open_document(path.clone()).await;
        self.state.write().await.focused = Some(path);
    }

    /// Drop the focus without closing anything.
    pub async fn clear_focus(&self) {
        self.state.write().await.focused = None;
    }
}

#[async_trait]
impl DocumentHost for FsDocumentHost {
    async fn focused_document(&self) -> Option<PathBuf> {
        self.state.read().await.focused.clone()
    }

    async fn open_documents(&self) -> Vec<PathBuf> {
        self.state.read().await.open.clone()
    }

    async fn read_document(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|err| document_error(path, err))
    }

    async fn apply_edit(&self, path: &Path, edit: &RewriteEdit) -> Result<Position> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| document_error(path, err))?;
        let (updated, cursor) = rewrite::apply(&text, edit);
        tokio::fs::write(path, &updated).await?;
        debug!(
            "applied edit to {} at {}:{}",
            path.display(),
            edit.range.start.line,
            edit.range.start.column
        );
        Ok(cursor)
    }
}

/// A document that does not exist is unavailable, not a raw I/O failure.
fn document_error(path: &Path, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::DocumentUnavailable(path.to_path_buf())
    } else {
        Error::Io(err)
    }
}
