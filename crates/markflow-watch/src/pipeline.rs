//! Post-capture pipeline: upload the image, then rewrite the owning
//! document's reference.
//!
//! The document is only ever touched after the uploader has reported
//! success, and every failure leaves the pipeline as a result value; no
//! error crosses this boundary as a panic or a propagated `Err`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use markflow_core::position::Position;
use markflow_core::{rewrite, DocumentHost, Uploader};

use crate::capture::ImageCapture;

/// The structured result of one rewrite attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Whether the reference was located and replaced.
    pub success: bool,
    /// Cursor line after the edit, when successful.
    pub line: Option<u32>,
    /// Cursor column after the edit, when successful.
    pub column: Option<u32>,
    /// What went wrong, when not successful.
    pub error: Option<String>,
}

impl RewriteOutcome {
    fn succeeded(cursor: Position) -> Self {
        Self {
            success: true,
            line: Some(cursor.line),
            column: Some(cursor.column),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            line: None,
            column: None,
            error: Some(error.into()),
        }
    }
}

/// What happened to one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// No upload was attempted.
    Skipped {
        /// Why the capture was skipped.
        reason: String,
    },
    /// The upload failed; the document was not touched.
    UploadFailed {
        /// The uploader that failed.
        provider: String,
        /// The reported failure.
        error: String,
    },
    /// The upload succeeded; the rewrite outcome is attached (upload
    /// success with a failed rewrite is still worth telling the user
    /// about).
    Uploaded {
        /// The remote URL of the uploaded image.
        url: String,
        /// How the rewrite went.
        rewrite: RewriteOutcome,
    },
}

/// Drives a capture through upload and link rewriting.
pub struct UploadPipeline {
    uploader: Arc<dyn Uploader>,
    host: Arc<dyn DocumentHost>,
    delete_local_after_upload: bool,
}

impl UploadPipeline {
    /// Create a pipeline over an uploader and a document host.
    pub fn new(uploader: Arc<dyn Uploader>, host: Arc<dyn DocumentHost>) -> Self {
        Self {
            uploader,
            host,
            delete_local_after_upload: false,
        }
    }

    /// Delete the local image file once its reference has been rewritten.
    pub fn with_delete_local(mut self, enabled: bool) -> Self {
        self.delete_local_after_upload = enabled;
        self
    }

    /// Process one capture end to end.
    pub async fn process(&self, capture: &ImageCapture) -> CaptureOutcome {
        if !self.uploader.is_configured() {
            return CaptureOutcome::Skipped {
                reason: format!("uploader '{}' is not configured", self.uploader.name()),
            };
        }
        let Some(document) = capture.markdown_file.as_deref() else {
            return CaptureOutcome::Skipped {
                reason: format!("no owning document for {}", capture.file_name),
            };
        };

        debug!(
            "uploading {} via {}",
            capture.file_path.display(),
            self.uploader.name()
        );
        let url = match self.uploader.upload(&capture.file_path).await {
            Ok(url) => url,
            Err(err) => {
                warn!("upload of {} failed: {err}", capture.file_name);
                return CaptureOutcome::UploadFailed {
                    provider: self.uploader.name().to_string(),
                    error: err.to_string(),
                };
            }
        };

        let outcome = self
            .rewrite_reference(document, &capture.file_path, &url)
            .await;

        if outcome.success && self.delete_local_after_upload {
            if let Err(err) = tokio::fs::remove_file(&capture.file_path).await {
                warn!(
                    "could not delete {} after upload: {err}",
                    capture.file_path.display()
                );
            }
        }

        CaptureOutcome::Uploaded {
            url,
            rewrite: outcome,
        }
    }

    /// The post-upload rewrite step on its own: locate the reference to
    /// `local_image` in `document` and point it at `remote_url`.
    pub async fn rewrite_reference(
        &self,
        document: &Path,
        local_image: &Path,
        remote_url: &str,
    ) -> RewriteOutcome {
        let text = match self.host.read_document(document).await {
            Ok(text) => text,
            Err(err) => {
                return RewriteOutcome::failed(format!(
                    "could not read {}: {err}",
                    document.display()
                ))
            }
        };

        let edit = match rewrite::rewrite(&text, document, local_image, remote_url) {
            Ok(edit) => edit,
            Err(err) => return RewriteOutcome::failed(err.to_string()),
        };

        match self.host.apply_edit(document, &edit).await {
            Ok(cursor) => {
                info!(
                    "rewrote {} -> {} in {}",
                    edit.original_path,
                    remote_url,
                    document.display()
                );
                RewriteOutcome::succeeded(cursor)
            }
            Err(err) => RewriteOutcome::failed(format!("could not apply edit: {err}")),
        }
    }
}
