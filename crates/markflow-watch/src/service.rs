//! The capture service: wires the backend, the dispatcher, and the
//! correlation machinery together.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use markflow_config::FlowConfig;
use markflow_core::{generate_watch_patterns, DocumentHost, WorkspaceResolver};

use crate::backend::{NotifyWatcher, SubscriptionReport, WatchPatternSet};
use crate::capture::ImageCapture;
use crate::correlator::{CaptureCorrelator, DebounceLedger};
use crate::error::{Error, Result};
use crate::events::ImageEventFilter;

/// Watches the workspace roots and emits one [`ImageCapture`] per
/// correlated image over an unbounded channel.
///
/// One dispatcher task owns the debounce ledger, so handling for the same
/// path is serialized; each accepted path is then stabilized and
/// correlated on its own task, so a slow write never blocks other paths.
pub struct CaptureService {
    config: Arc<FlowConfig>,
    workspace: Arc<dyn WorkspaceResolver>,
    host: Arc<dyn DocumentHost>,
    watcher: Option<NotifyWatcher>,
    dispatcher: Option<JoinHandle<()>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    capture_rx: Option<mpsc::UnboundedReceiver<ImageCapture>>,
    is_running: bool,
}

impl CaptureService {
    /// Create a service over the given configuration snapshot and host
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
            watcher: None,
            dispatcher: None,
            shutdown_tx: None,
            capture_rx: None,
            is_running: false,
        }
    }

    /// Start watching.
    ///
    /// Returns the subscription report; a degraded report means some
    /// patterns or roots could not be subscribed and the service runs
    /// with the rest.
    pub async fn start(&mut self) -> Result<SubscriptionReport> {
        if self.is_running {
            return Err(Error::AlreadyRunning);
        }
        if !self.config.enabled {
            return Err(Error::Disabled);
        }

        let mut report = SubscriptionReport::default();
        let patterns = generate_watch_patterns(
            &self.config.destination_rules,
            &self.config.image_extension_glob(),
        );
        debug!("watch patterns: {patterns:?}");
        let pattern_set = WatchPatternSet::compile(&patterns, &mut report);

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut watcher = NotifyWatcher::new();
        watcher.set_event_sender(event_tx);

        let roots = self.workspace.roots();
        if roots.is_empty() {
            warn!("no workspace roots available to watch");
            report
                .failed
                .push(("<roots>".to_string(), "no workspace roots available".to_string()));
        }
        for root in &roots {
            if let Err(err) = watcher.watch_root(root) {
                warn!("could not watch {}: {err}", root.display());
                report.failed.push((root.display().to_string(), err.to_string()));
            }
        }

        let (capture_tx, capture_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let correlator = CaptureCorrelator::new(
            self.config.clone(),
            self.workspace.clone(),
            self.host.clone(),
        );
        let filter = ImageEventFilter::from_config(&self.config);
        let workspace = self.workspace.clone();
        let mut ledger = DebounceLedger::new(self.config.debounce_window());

        let dispatcher = tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        let Some(event) = maybe_event else { break };
                        if !filter.matches(&event) {
                            continue;
                        }

                        let relative = match workspace.workspace_folder(&event.path) {
                            Some(root) => event
                                .path
                                .strip_prefix(&root)
                                .map(|p| p.to_path_buf())
                                .unwrap_or_else(|_| event.path.clone()),
                            None => event.path.clone(),
                        };
                        if !pattern_set.matches(&relative) {
                            trace!("{} outside watch patterns", event.path.display());
                            continue;
                        }

                        if !ledger.accept(&event) {
                            continue;
                        }

                        debug!(
                            "processing {} event for {}",
                            event.kind.as_str(),
                            event.path.display()
                        );
                        let correlator = correlator.clone();
                        let capture_tx = capture_tx.clone();
                        // Stabilization can take up to the full poll
                        // budget; run it off the dispatcher so other
                        // paths keep flowing.
                        tokio::spawn(async move {
                            if let Some(capture) = correlator.process(&event.path).await {
                                if capture_tx.send(capture).is_err() {
                                    debug!("capture receiver dropped");
                                }
                            }
                        });
                    }
                    _ = shutdown_rx.recv() => {
                        info!("capture dispatcher shutting down");
                        break;
                    }
                }
            }
        });

        self.watcher = Some(watcher);
        self.dispatcher = Some(dispatcher);
        self.shutdown_tx = Some(shutdown_tx);
        self.capture_rx = Some(capture_rx);
        self.is_running = true;

        info!(
            "capture service started: {} active pattern(s), {} root(s)",
            report.active.len(),
            roots.len()
        );
        Ok(report)
    }

    /// Take the capture stream. Available once per `start`.
    pub fn take_captures(&mut self) -> Option<mpsc::UnboundedReceiver<ImageCapture>> {
        self.capture_rx.take()
    }

    /// Whether the service is currently watching.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Stop watching and wait for the dispatcher to drain.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.is_running {
            return Ok(());
        }

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }
        if let Some(task) = self.dispatcher.take() {
            let _ = task.await;
        }
        // Dropping the watcher tears down the notify subscriptions.
        self.watcher = None;
        self.capture_rx = None;
        self.is_running = false;

        info!("capture service stopped");
        Ok(())
    }
}
