//! Scanning markdown text for image references.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::paths;
use crate::position::{position_at, Position, Range};

/// Extensions the link scanner treats as local images. Wider than the
/// capture set: references to bmp/ico files are recognized even though the
/// watcher never captures them.
pub const LOCAL_IMAGE_EXTENSIONS: [&str; 8] =
    ["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico"];

static IMAGE_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("image link regex"));

/// One `![alt](path)` reference found in document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLink {
    /// The alt text between the brackets (may be empty).
    pub alt_text: String,

    /// The path between the parentheses, verbatim.
    pub path: String,

    /// Byte offsets of the full reference within the document text.
    pub byte_range: (usize, usize),

    /// Line/column range of the full reference.
    pub range: Range,

    /// Whether the path looks like a local image file.
    pub is_local: bool,
}

/// Whether an image path refers to a local file rather than a remote or
/// inline resource.
pub fn is_local_image_path(path: &str) -> bool {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("data:") {
        return false;
    }
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            LOCAL_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Find every image reference in `text`, in document order.
pub fn find_image_links(text: &str) -> Vec<ImageLink> {
    IMAGE_LINK_REGEX
        .captures_iter(text)
        .map(|captures| {
            let full = captures.get(0).expect("match has a full capture");
            let path = captures[2].to_string();
            let is_local = is_local_image_path(&path);
            ImageLink {
                alt_text: captures[1].to_string(),
                path,
                byte_range: (full.start(), full.end()),
                range: range_of(text, full.start(), full.end()),
                is_local,
            }
        })
        .collect()
}

/// Resolve an image path from a document against the document's directory.
pub fn resolve_absolute(document_path: &Path, image_path: &str) -> PathBuf {
    let document_dir = document_path.parent().unwrap_or_else(|| Path::new(""));
    paths::normalize(&document_dir.join(image_path))
}

fn range_of(text: &str, start: usize, end: usize) -> Range {
    Range::new(position_at(text, start), position_at(text, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_and_data_urls_are_not_local() {
        assert!(!is_local_image_path("https://cdn.example.com/a.png"));
        assert!(!is_local_image_path("http://cdn.example.com/a.png"));
        assert!(!is_local_image_path("data:image/png;base64,AAAA"));
    }

    #[test]
    fn local_detection_covers_rewriter_extensions() {
        assert!(is_local_image_path("./a.png"));
        assert!(is_local_image_path("img/shot.JPEG"));
        assert!(is_local_image_path("icon.bmp"));
        assert!(is_local_image_path("favicon.ico"));
        assert!(!is_local_image_path("doc.pdf"));
        assert!(!is_local_image_path("no-extension"));
    }

    #[test]
    fn finds_links_in_document_order() {
        let text = "intro\n![a](one.png) and ![b](https://cdn/two.png)\n![](three.gif)\n";
        let links = find_image_links(text);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].path, "one.png");
        assert!(links[0].is_local);
        assert_eq!(links[1].path, "https://cdn/two.png");
        assert!(!links[1].is_local);
        assert_eq!(links[2].alt_text, "");
        assert!(links[2].is_local);
    }

    #[test]
    fn link_positions_are_line_relative() {
        let text = "line one\n  ![shot](img/shot.png) tail\n";
        let links = find_image_links(text);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].range.start, Position::new(1, 2));
        assert_eq!(
            links[0].range.end,
            Position::new(1, 2 + "![shot](img/shot.png)".chars().count() as u32)
        );
    }

    #[test]
    fn no_links_in_plain_text() {
        assert!(find_image_links("nothing [here](x.png) to see").is_empty());
    }

    #[test]
    fn resolve_absolute_normalizes() {
        assert_eq!(
            resolve_absolute(Path::new("/ws/docs/note.md"), "../assets/img.png"),
            PathBuf::from("/ws/assets/img.png")
        );
        assert_eq!(
            resolve_absolute(Path::new("/ws/docs/note.md"), "./img.png"),
            PathBuf::from("/ws/docs/img.png")
        );
    }
}
