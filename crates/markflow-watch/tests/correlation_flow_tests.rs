//! End-to-end correlation and rewrite flow, driven with synthetic events.
//!
//! These tests exercise the ledger -> correlator -> pipeline chain against
//! a real temporary workspace, without going through notify.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use markflow_config::{DestinationRule, FlowConfig, StabilizationConfig};
use markflow_core::{
    Error as CoreError, FsDocumentHost, Result as CoreResult, StaticWorkspace, Uploader,
};
use markflow_watch::{
    CaptureCorrelator, CaptureOutcome, DebounceLedger, FileEvent, FileEventKind, UploadPipeline,
};

struct CdnUploader;

#[async_trait]
impl Uploader for CdnUploader {
    fn name(&self) -> &str {
        "cdn"
    }

    async fn upload(&self, path: &Path) -> CoreResult<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::Upload("image has no name".to_string()))?;
        Ok(format!("https://cdn.example.com/{name}"))
    }
}

fn write_file(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn fast_stabilization() -> StabilizationConfig {
    StabilizationConfig {
        max_attempts: 10,
        interval_ms: 20,
        post_stable_delay_ms: 10,
    }
}

fn correlator_over(
    root: &Path,
    config: FlowConfig,
    host: Arc<FsDocumentHost>,
) -> CaptureCorrelator {
    CaptureCorrelator::new(
        Arc::new(config),
        Arc::new(StaticWorkspace::new([root.to_path_buf()])),
        host,
    )
}

#[tokio::test]
async fn rule_based_correlation_finds_the_predicted_document() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("docs/note.md"), b"![shot](assets/img.png)\n");
    write_file(&root.join("blog/post.md"), b"unrelated\n");
    write_file(&root.join("docs/assets/img.png"), b"png bytes");

    let config = FlowConfig {
        destination_rules: vec![DestinationRule::new("docs/**/*.md", "assets/")],
        stabilization: fast_stabilization(),
        ..FlowConfig::default()
    };
    let correlator = correlator_over(root, config, Arc::new(FsDocumentHost::new()));

    let capture = correlator
        .process(&root.join("docs/assets/img.png"))
        .await
        .expect("image should be captured");

    assert_eq!(capture.file_name, "img.png");
    assert_eq!(capture.markdown_file, Some(root.join("docs/note.md")));
    assert_eq!(capture.relative_path, PathBuf::from("docs/assets/img.png"));
    assert!(capture.is_correlated());
}

#[tokio::test]
async fn fallback_correlation_prefers_the_focused_document() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("a.md"), b"first\n");
    write_file(&root.join("b.md"), b"second\n");
    write_file(&root.join("img.png"), b"png bytes");

    let host = Arc::new(FsDocumentHost::new());
    host.open_document(root.join("a.md")).await;
    host.focus(root.join("b.md")).await;

    let config = FlowConfig {
        stabilization: fast_stabilization(),
        ..FlowConfig::default()
    };
    let correlator = correlator_over(root, config, host);

    let capture = correlator.process(&root.join("img.png")).await.unwrap();
    assert_eq!(capture.markdown_file, Some(root.join("b.md")));
}

#[tokio::test]
async fn image_without_any_document_still_produces_a_capture() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("img.png"), b"png bytes");

    let config = FlowConfig {
        stabilization: fast_stabilization(),
        ..FlowConfig::default()
    };
    let correlator = correlator_over(root, config, Arc::new(FsDocumentHost::new()));

    let capture = correlator.process(&root.join("img.png")).await.unwrap();
    assert_eq!(capture.markdown_file, None);
    assert!(!capture.is_correlated());
}

#[tokio::test]
async fn slow_write_is_still_captured() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("note.md"), b"doc\n");
    let image = root.join("img.png");
    write_file(&image, b"");

    // Simulate the editor finishing the write a few polls in.
    let writer_path = image.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        std::fs::write(&writer_path, b"now it has bytes").unwrap();
    });

    let config = FlowConfig {
        stabilization: fast_stabilization(),
        ..FlowConfig::default()
    };
    let correlator = correlator_over(root, config, Arc::new(FsDocumentHost::new()));

    let capture = correlator.process(&image).await;
    assert!(capture.is_some());
}

#[tokio::test]
async fn file_that_never_fills_is_abandoned_silently() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let image = root.join("img.png");
    write_file(&image, b"");

    let config = FlowConfig {
        stabilization: StabilizationConfig {
            max_attempts: 3,
            interval_ms: 10,
            post_stable_delay_ms: 10,
        },
        ..FlowConfig::default()
    };
    let correlator = correlator_over(root, config, Arc::new(FsDocumentHost::new()));

    assert!(correlator.process(&image).await.is_none());
}

#[tokio::test]
async fn debounced_duplicate_events_yield_one_processing_attempt() {
    let config = FlowConfig::default();
    let mut ledger = DebounceLedger::new(config.debounce_window());
    let path = PathBuf::from("/ws/img.png");

    let first = FileEvent::new(FileEventKind::Created, path.clone());
    let duplicate = FileEvent::new(FileEventKind::Created, path.clone());
    let trailing_modify = FileEvent::new(FileEventKind::Modified, path);

    assert!(ledger.accept(&first));
    assert!(!ledger.accept(&duplicate));
    assert!(!ledger.accept(&trailing_modify));
}

#[tokio::test]
async fn captured_image_flows_through_upload_and_rewrite() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let document = root.join("docs/note.md");
    write_file(&document, b"# Notes\n\n![screen](assets/img.png)\n");
    write_file(&root.join("docs/assets/img.png"), b"png bytes");

    let config = FlowConfig {
        destination_rules: vec![DestinationRule::new("docs/**/*.md", "assets/")],
        stabilization: fast_stabilization(),
        ..FlowConfig::default()
    };
    let host = Arc::new(FsDocumentHost::new());
    let correlator = correlator_over(root, config, host.clone());

    let capture = correlator
        .process(&root.join("docs/assets/img.png"))
        .await
        .unwrap();

    let pipeline = UploadPipeline::new(Arc::new(CdnUploader), host);
    let outcome = pipeline.process(&capture).await;

    let CaptureOutcome::Uploaded { url, rewrite } = outcome else {
        panic!("expected Uploaded, got {outcome:?}");
    };
    assert_eq!(url, "https://cdn.example.com/img.png");
    assert!(rewrite.success);
    assert_eq!(rewrite.line, Some(2));

    let text = std::fs::read_to_string(&document).unwrap();
    assert!(text.contains("![screen](https://cdn.example.com/img.png)"));
}
