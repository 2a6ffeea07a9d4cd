//! The capture-and-correlate state machine.
//!
//! Per observed path: `Created -> Debounced/Stabilizing -> Correlated |
//! Abandoned`. The [`DebounceLedger`] decides which events are worth
//! processing at all and is owned by a single dispatcher, which gives
//! same-path serialization for free; the [`CaptureCorrelator`] then does
//! the bounded waiting and the owner decision, and is safe to run
//! concurrently for different paths.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use markflow_config::FlowConfig;
use markflow_core::{is_expected_path, paths, DocumentHost, WorkspaceResolver};

use crate::capture::ImageCapture;
use crate::events::{FileEvent, FileEventKind};
use crate::scanner;

/// Tracks recently seen paths so duplicate create/modify pairs for the
/// same physical write collapse into one processing attempt.
///
/// Records expire at twice the window; expired records are swept on every
/// call, so the map never needs a timer and never grows past the set of
/// paths seen in the last two windows.
#[derive(Debug)]
pub struct DebounceLedger {
    window: Duration,
    recent: HashMap<PathBuf, Instant>,
}

impl DebounceLedger {
    /// Create a ledger with the given debounce window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            recent: HashMap::new(),
        }
    }

    /// Decide whether `event` should start a processing attempt.
    ///
    /// A create within the window of a previous record is a duplicate and
    /// is dropped. A modify is only re-processed while a recent creation
    /// record exists (within twice the window); otherwise it is an edit of
    /// some pre-existing image and is ignored.
    pub fn accept(&mut self, event: &FileEvent) -> bool {
        self.sweep();

        match event.kind {
            FileEventKind::Created => match self.recent.get(&event.path) {
                Some(seen) if seen.elapsed() < self.window => {
                    trace!("debounced duplicate create for {}", event.path.display());
                    false
                }
                _ => {
                    self.recent.insert(event.path.clone(), Instant::now());
                    true
                }
            },
            FileEventKind::Modified => match self.recent.get(&event.path) {
                Some(seen) if seen.elapsed() < self.window => {
                    trace!("debounced modify for {}", event.path.display());
                    false
                }
                // Still within twice the window after the sweep: the file
                // was created moments ago and is being written to.
                Some(_) => {
                    self.recent.insert(event.path.clone(), Instant::now());
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Drop records older than twice the window.
    pub fn sweep(&mut self) {
        let horizon = self.window * 2;
        self.recent.retain(|_, seen| seen.elapsed() < horizon);
    }

    /// Number of paths currently tracked.
    pub fn tracked(&self) -> usize {
        self.recent.len()
    }
}

/// Correlates a stabilized image file with the document that caused it to
/// be saved.
#[derive(Clone)]
pub struct CaptureCorrelator {
    config: Arc<FlowConfig>,
    workspace: Arc<dyn WorkspaceResolver>,
    host: Arc<dyn DocumentHost>,
}

impl CaptureCorrelator {
    /// Create a correlator over the given configuration snapshot and host
    /// capabilities.
    pub fn new(
        config: Arc<FlowConfig>,
        workspace: Arc<dyn WorkspaceResolver>,
        host: Arc<dyn DocumentHost>,
    ) -> Self {
        Self {
            config,
            workspace,
            host,
        }
    }

    /// Run the full stabilize-then-correlate sequence for one accepted
    /// path. Returns `None` when the file never reaches a non-zero size
    /// within the poll budget; partial and aborted pastes are common and
    /// not an error.
    pub async fn process(&self, path: &Path) -> Option<ImageCapture> {
        if !self.wait_for_stable(path).await {
            debug!("abandoning {}: file never stabilized", path.display());
            return None;
        }

        let file_name = path.file_name()?.to_str()?.to_string();
        let candidates = self.discover_candidates(path, &file_name).await;
        let owner = self.select_owner(path, &candidates).await;
        if owner.is_none() {
            debug!("no owning document found for {}", path.display());
        }

        let relative_path = match self.workspace.workspace_folder(path) {
            Some(root) => path
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.to_path_buf()),
            None => path.to_path_buf(),
        };

        Some(ImageCapture {
            file_path: path.to_path_buf(),
            file_name,
            relative_path,
            markdown_file: owner,
            created_time: file_created_time(path).await,
        })
    }

    /// Poll the file size until it is non-zero, then wait one extra delay
    /// so the last bytes have been flushed.
    async fn wait_for_stable(&self, path: &Path) -> bool {
        let poll = &self.config.stabilization;
        for attempt in 0..poll.max_attempts {
            if let Ok(metadata) = tokio::fs::metadata(path).await {
                if metadata.len() > 0 {
                    trace!(
                        "{} stable after {} attempt(s)",
                        path.display(),
                        attempt + 1
                    );
                    tokio::time::sleep(poll.post_stable_delay()).await;
                    return true;
                }
            }
            tokio::time::sleep(poll.interval()).await;
        }
        false
    }

    /// Build the candidate set, completing discovery before any decision.
    ///
    /// With rules configured a document qualifies only when prediction for
    /// it lands exactly on the observed path; without rules every markdown
    /// file sharing the image's directory qualifies.
    async fn discover_candidates(&self, image_path: &Path, file_name: &str) -> Vec<PathBuf> {
        if self.config.destination_rules.is_empty() {
            let dir = image_path.parent().unwrap_or_else(|| Path::new(""));
            return scanner::markdown_files_in(dir, &self.config).await;
        }

        let mut candidates = Vec::new();
        for root in self.workspace.roots() {
            for document in scanner::markdown_files_under(&root, &self.config).await {
                if is_expected_path(
                    image_path,
                    &document,
                    file_name,
                    &self.config.destination_rules,
                    Some(&root),
                ) && !candidates.contains(&document)
                {
                    candidates.push(document);
                }
            }
        }
        candidates
    }

    /// Choose the owning document: the focused document if it is a
    /// candidate, else the most recently opened candidate, else the
    /// candidate whose directory is closest to the image's directory
    /// (ties keep first-seen order).
    async fn select_owner(&self, image_path: &Path, candidates: &[PathBuf]) -> Option<PathBuf> {
        match candidates {
            [] => None,
            [only] => Some(only.clone()),
            _ => {
                if let Some(focused) = self.host.focused_document().await {
                    if candidates.contains(&focused) {
                        debug!("owner by focus: {}", focused.display());
                        return Some(focused);
                    }
                }

                for open in self.host.open_documents().await {
                    if candidates.contains(&open) {
                        debug!("owner by open recency: {}", open.display());
                        return Some(open);
                    }
                }

                let image_dir = image_path.parent().unwrap_or_else(|| Path::new(""));
                let mut best = candidates[0].clone();
                let mut best_distance = directory_distance(image_dir, &best);
                for candidate in &candidates[1..] {
                    let distance = directory_distance(image_dir, candidate);
                    if distance < best_distance {
                        best_distance = distance;
                        best = candidate.clone();
                    }
                }
                debug!("owner by path distance: {}", best.display());
                Some(best)
            }
        }
    }
}

fn directory_distance(image_dir: &Path, candidate: &Path) -> usize {
    let candidate_dir = candidate.parent().unwrap_or_else(|| Path::new(""));
    paths::path_distance(image_dir, candidate_dir)
}

async fn file_created_time(path: &Path) -> DateTime<Utc> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata
            .created()
            .or_else(|_| metadata.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now()),
        Err(_) => Utc::now(),
    }
}
