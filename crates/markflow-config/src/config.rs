//! The configuration snapshot consumed by the capture and rewrite engine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;

/// A destination rule pairing a document glob with a save-location pattern.
///
/// Rules are ordered; the *first* rule whose `pattern` matches a document's
/// workspace-relative path decides where the host editor saves a pasted
/// image for that document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationRule {
    /// Glob matched against the document's workspace-relative path
    /// (forward slashes).
    pub pattern: String,

    /// Destination pattern. `${...}` variables are substituted per
    /// document; a trailing `/` marks a directory, to which the image
    /// file name is appended.
    pub destination: String,
}

impl DestinationRule {
    /// Create a new rule.
    pub fn new(pattern: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            destination: destination.into(),
        }
    }
}

/// Polling parameters for write-completion detection.
///
/// A create event can arrive before the editor has flushed all bytes, so
/// the watcher polls the file size until it is non-zero, then waits one
/// extra delay before reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StabilizationConfig {
    /// Maximum number of size polls before the file is abandoned.
    pub max_attempts: u32,

    /// Delay between polls, in milliseconds.
    pub interval_ms: u64,

    /// Extra delay after the first non-zero size, in milliseconds.
    pub post_stable_delay_ms: u64,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval_ms: 50,
            post_stable_delay_ms: 100,
        }
    }
}

impl StabilizationConfig {
    /// Delay between size polls.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Delay applied once the file has reached a non-zero size.
    pub fn post_stable_delay(&self) -> Duration {
        Duration::from_millis(self.post_stable_delay_ms)
    }
}

/// Immutable configuration snapshot for one run of the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
    /// Master switch; a disabled snapshot produces no captures.
    pub enabled: bool,

    /// Ordered destination rules. Empty means the host editor's default
    /// behavior: images land next to the document.
    pub destination_rules: Vec<DestinationRule>,

    /// Image extensions the watcher reacts to (lowercase, no dot).
    pub image_extensions: Vec<String>,

    /// Extensions that identify a document as markdown.
    pub markdown_extensions: Vec<String>,

    /// Minimum time between accepted processing attempts for the same
    /// file path, in milliseconds.
    pub debounce_window_ms: u64,

    /// Write-completion polling parameters.
    pub stabilization: StabilizationConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            destination_rules: Vec::new(),
            image_extensions: ["png", "jpg", "jpeg", "gif", "webp", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            markdown_extensions: ["md", "markdown"].into_iter().map(String::from).collect(),
            debounce_window_ms: 500,
            stabilization: StabilizationConfig::default(),
        }
    }
}

impl FlowConfig {
    /// Create a snapshot with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot from a TOML file.
    ///
    /// A missing file is not an error: defaults are returned, matching the
    /// documented fallback behavior for absent configuration.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config: FlowConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load a snapshot synchronously (for non-async contexts).
    pub fn load_sync(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: FlowConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// The debounce window as a [`Duration`].
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    /// Whether `path` has one of the configured image extensions.
    pub fn is_image_path(&self, path: &Path) -> bool {
        Self::has_extension(path, &self.image_extensions)
    }

    /// Whether `path` has one of the configured markdown extensions.
    pub fn is_markdown_path(&self, path: &Path) -> bool {
        Self::has_extension(path, &self.markdown_extensions)
    }

    /// The brace glob covering every configured image extension, e.g.
    /// `*.{png,jpg,jpeg,gif,webp,svg}`.
    pub fn image_extension_glob(&self) -> String {
        format!("*.{{{}}}", self.image_extensions.join(","))
    }

    fn has_extension(path: &Path, extensions: &[String]) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}
