//! Bounded markdown-file discovery.
//!
//! Candidate discovery needs the markdown files of a workspace (or of one
//! directory) *before* correlation decides an owner, so these walks are
//! awaited, bounded, and deterministic: entries are visited in name order
//! and the recursive walk stops at a file cap rather than growing with the
//! workspace.

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use markflow_config::FlowConfig;

/// Directory names skipped during discovery.
const SKIPPED_DIRS: [&str; 4] = [".git", "node_modules", "target", ".obsidian"];

/// Cap on how many markdown files a recursive walk returns.
pub const MAX_DISCOVERED_FILES: usize = 100;

/// List markdown files directly inside `dir`, in name order.
pub async fn markdown_files_in(dir: &Path, config: &FlowConfig) -> Vec<PathBuf> {
    let mut entries = read_dir_sorted(dir).await;
    entries.retain(|(path, is_dir)| !is_dir && config.is_markdown_path(path));
    entries.into_iter().map(|(path, _)| path).collect()
}

/// Recursively list markdown files under `root`, in depth-first name
/// order, up to [`MAX_DISCOVERED_FILES`].
pub async fn markdown_files_under(root: &Path, config: &FlowConfig) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if found.len() >= MAX_DISCOVERED_FILES {
            debug!(
                "markdown discovery under {} stopped at {} files",
                root.display(),
                MAX_DISCOVERED_FILES
            );
            break;
        }

        let mut subdirs = Vec::new();
        for (path, is_dir) in read_dir_sorted(&dir).await {
            if is_dir {
                if !is_skipped_dir(&path) {
                    subdirs.push(path);
                }
            } else if config.is_markdown_path(&path) && found.len() < MAX_DISCOVERED_FILES {
                found.push(path);
            }
        }
        // Reverse so the stack pops subdirectories in name order.
        stack.extend(subdirs.into_iter().rev());
    }

    trace!("found {} markdown files under {}", found.len(), root.display());
    found
}

async fn read_dir_sorted(dir: &Path) -> Vec<(PathBuf, bool)> {
    let mut out = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return out;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        out.push((entry.path(), is_dir));
    }
    out.sort_by(|(a, _), (b, _)| a.cmp(b));
    out
}

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| SKIPPED_DIRS.contains(&name) || name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[tokio::test]
    async fn lists_markdown_in_one_directory() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("b.md"));
        touch(&temp.path().join("a.md"));
        touch(&temp.path().join("c.txt"));
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        touch(&temp.path().join("sub/nested.md"));

        let files = markdown_files_in(temp.path(), &FlowConfig::default()).await;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[tokio::test]
    async fn walks_recursively_in_name_order() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("z.md"));
        touch(&temp.path().join("alpha/one.md"));
        touch(&temp.path().join("beta/two.markdown"));
        touch(&temp.path().join("beta/skip.png"));

        let files = markdown_files_under(temp.path(), &FlowConfig::default()).await;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["z.md", "one.md", "two.markdown"]);
    }

    #[tokio::test]
    async fn skips_noise_directories() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("keep.md"));
        touch(&temp.path().join("node_modules/pkg/readme.md"));
        touch(&temp.path().join(".git/description.md"));
        touch(&temp.path().join(".obsidian/hidden.md"));

        let files = markdown_files_under(temp.path(), &FlowConfig::default()).await;
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.md"));
    }

    #[tokio::test]
    async fn respects_file_cap() {
        let temp = TempDir::new().unwrap();
        for i in 0..(MAX_DISCOVERED_FILES + 20) {
            touch(&temp.path().join(format!("note-{i:04}.md")));
        }
        let files = markdown_files_under(temp.path(), &FlowConfig::default()).await;
        assert_eq!(files.len(), MAX_DISCOVERED_FILES);
    }

    #[tokio::test]
    async fn missing_directory_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("absent");
        assert!(markdown_files_in(&gone, &FlowConfig::default()).await.is_empty());
        assert!(markdown_files_under(&gone, &FlowConfig::default()).await.is_empty());
    }
}
