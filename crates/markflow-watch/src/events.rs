//! File event types and the image event filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use markflow_config::FlowConfig;

/// Represents a file system event delivered by a watching backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEvent {
    /// Unique identifier for this event.
    pub id: Uuid,

    /// Kind of file event.
    pub kind: FileEventKind,

    /// Path to the file.
    pub path: PathBuf,

    /// Timestamp when the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl FileEvent {
    /// Create a new file event.
    pub fn new(kind: FileEventKind, path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            path,
            timestamp: Utc::now(),
        }
    }

    /// Get the file extension, lowercased, if available.
    pub fn extension(&self) -> Option<String> {
        self.path.extension()?.to_str().map(|s| s.to_lowercase())
    }

    /// Get the file name as a string.
    pub fn file_name(&self) -> Option<String> {
        self.path.file_name()?.to_str().map(|s| s.to_string())
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<PathBuf> {
        self.path.parent().map(|p| p.to_path_buf())
    }
}

/// Kinds of file events the watcher reacts to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was created.
    Created,
    /// File was modified.
    Modified,
    /// File was removed.
    Removed,
    /// Anything else the backend reported.
    Other(String),
}

impl FileEventKind {
    /// Whether this event can represent a fresh image write.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }

    /// Get a string representation of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Other(_) => "other",
        }
    }
}

/// Directory names never worth reacting to.
const EXCLUDED_DIRS: [&str; 4] = [".git", "node_modules", "target", ".obsidian"];

/// Filters raw file events down to plausible image saves.
///
/// The filter is intentionally cheap: it only looks at the path. Whether
/// the file is *really* a fresh, fully-written pasted image is decided
/// later by debouncing and stabilization.
#[derive(Debug, Clone)]
pub struct ImageEventFilter {
    extensions: Vec<String>,
}

impl ImageEventFilter {
    /// Build the filter from a configuration snapshot.
    pub fn from_config(config: &FlowConfig) -> Self {
        Self {
            extensions: config.image_extensions.clone(),
        }
    }

    /// Whether the event looks like an image write worth processing.
    pub fn matches(&self, event: &FileEvent) -> bool {
        if !event.kind.is_write() {
            return false;
        }

        let Some(ext) = event.extension() else {
            return false;
        };
        if !self.extensions.iter().any(|e| *e == ext) {
            return false;
        }

        let Some(file_name) = event.file_name() else {
            return false;
        };
        if is_temp_name(&file_name) {
            return false;
        }

        !event
            .path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .any(|segment| EXCLUDED_DIRS.contains(&segment))
    }
}

fn is_temp_name(file_name: &str) -> bool {
    file_name.starts_with('.')
        || file_name.starts_with('~')
        || file_name.ends_with('~')
        || file_name.ends_with(".tmp")
        || file_name.ends_with(".swp")
        || file_name.ends_with(".bak")
        || file_name.contains('#')
}
