//! Notify-based file watching backend.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::events::{FileEvent, FileEventKind};

/// Coalescing interval for raw OS notifications. The semantic per-path
/// debounce (default 500 ms) happens later in the ledger; this only folds
/// the storm of events a single write produces.
const OS_EVENT_COALESCE: Duration = Duration::from_millis(100);

/// How watch-pattern setup went: which patterns are live and which were
/// rejected. Partial capability is preferred over total failure, so a
/// degraded report is not an error.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionReport {
    /// Patterns that compiled and are being applied.
    pub active: Vec<String>,
    /// `(pattern, reason)` pairs for patterns that could not be used.
    pub failed: Vec<(String, String)>,
}

impl SubscriptionReport {
    /// Whether any pattern failed to subscribe.
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// The compiled watch patterns, applied to workspace-relative paths.
pub struct WatchPatternSet {
    set: GlobSet,
    compiled: usize,
}

impl WatchPatternSet {
    /// Compile generated watch patterns, recording failures in `report`.
    ///
    /// Relative patterns additionally get an any-depth (`**/`-prefixed)
    /// variant: destination patterns are resolved against document
    /// directories at save time, so a save under a nested document must
    /// still match. False positives are filtered later by prediction; a
    /// missed event can never be recovered.
    pub fn compile(patterns: &[String], report: &mut SubscriptionReport) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut compiled = 0;

        for pattern in patterns {
            match GlobBuilder::new(pattern).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                    if !pattern.starts_with("**/") && !pattern.starts_with('/') {
                        if let Ok(any_depth) = GlobBuilder::new(&format!("**/{pattern}"))
                            .literal_separator(true)
                            .build()
                        {
                            builder.add(any_depth);
                        }
                    }
                    compiled += 1;
                    report.active.push(pattern.clone());
                }
                Err(err) => {
                    warn!("watch pattern '{pattern}' rejected: {err}");
                    report.failed.push((pattern.clone(), err.to_string()));
                }
            }
        }

        let set = match builder.build() {
            Ok(set) => set,
            Err(err) => {
                warn!("watch pattern set failed to build: {err}");
                report
                    .failed
                    .push(("<pattern set>".to_string(), err.to_string()));
                compiled = 0;
                GlobSet::empty()
            }
        };

        Self { set, compiled }
    }

    /// Whether a workspace-relative path is covered.
    ///
    /// With nothing compiled everything matches: over-broad is safe,
    /// under-broad loses events.
    pub fn matches(&self, relative: &Path) -> bool {
        self.compiled == 0 || self.set.is_match(relative)
    }
}

/// Notify-based file watcher with debouncing support.
pub struct NotifyWatcher {
    /// Debounced file system watcher.
    debouncer: Option<Debouncer<RecommendedWatcher, notify_debouncer_full::NoCache>>,
    /// Event sender.
    event_sender: Option<mpsc::UnboundedSender<FileEvent>>,
    /// Roots being watched.
    watched_roots: Vec<PathBuf>,
}

impl NotifyWatcher {
    /// Create a new notify-based watcher.
    pub fn new() -> Self {
        Self {
            debouncer: None,
            event_sender: None,
            watched_roots: Vec::new(),
        }
    }

    /// Set the event sender. Must be called before adding any watch.
    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<FileEvent>) {
        self.event_sender = Some(sender);
    }

    /// Initialize the underlying debounced watcher.
    fn initialize(&mut self) -> Result<()> {
        let sender = self
            .event_sender
            .clone()
            .ok_or_else(|| Error::Watch("event sender not set before watching".to_string()))?;

        let debouncer = new_debouncer(
            OS_EVENT_COALESCE,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        for file_event in Self::convert(event) {
                            if let Err(e) = sender.send(file_event) {
                                error!("failed to forward file event: {e}");
                            }
                        }
                    }
                }
                Err(errors) => {
                    for err in errors {
                        error!("notify error: {err:?}");
                    }
                }
            },
        )
        .map_err(|e| Error::Watch(format!("failed to create notify watcher: {e}")))?;

        self.debouncer = Some(debouncer);
        info!("notify watcher initialized");
        Ok(())
    }

    /// Convert a debounced notify event into our event type, one per path.
    fn convert(event: DebouncedEvent) -> Vec<FileEvent> {
        let kind = match event.event.kind {
            EventKind::Create(_) => FileEventKind::Created,
            EventKind::Modify(_) => FileEventKind::Modified,
            EventKind::Remove(_) => FileEventKind::Removed,
            other => FileEventKind::Other(format!("{other:?}")),
        };

        event
            .event
            .paths
            .iter()
            .map(|path| FileEvent::new(kind.clone(), path.clone()))
            .collect()
    }

    /// Start watching a root recursively.
    pub fn watch_root(&mut self, root: &Path) -> Result<()> {
        if self.debouncer.is_none() {
            self.initialize()?;
        }

        if let Some(ref mut debouncer) = self.debouncer {
            debouncer
                .watch(root, RecursiveMode::Recursive)
                .map_err(|e| Error::Watch(format!("failed to watch {}: {e}", root.display())))?;
        }

        self.watched_roots.push(root.to_path_buf());
        info!("watching {} recursively", root.display());
        Ok(())
    }

    /// Stop watching a root.
    pub fn unwatch_root(&mut self, root: &Path) -> Result<()> {
        if let Some(ref mut debouncer) = self.debouncer {
            debouncer
                .unwatch(root)
                .map_err(|e| Error::Watch(format!("failed to unwatch {}: {e}", root.display())))?;
        }
        self.watched_roots.retain(|r| r != root);
        info!("stopped watching {}", root.display());
        Ok(())
    }

    /// The roots currently being watched.
    pub fn watched_roots(&self) -> &[PathBuf] {
        &self.watched_roots
    }
}

impl Default for NotifyWatcher {
    fn default() -> Self {
        Self::new()
    }
}
