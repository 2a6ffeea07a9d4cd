//! Lexical path utilities.
//!
//! Prediction compares paths that may not exist yet, so everything here is
//! lexical: no filesystem access, no symlink resolution.

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically, resolving `.` and `..` components.
///
/// Leading `..` components of a relative path are kept, since there is
/// nothing to pop them against.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Render a path with forward slashes regardless of platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compute `target` relative to `base`, lexically.
///
/// Both paths are normalized first; shared leading components are dropped
/// and each remaining `base` component becomes a `..`.
pub fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base = normalize(base);
    let target = normalize(target);

    let base_parts: Vec<_> = base.components().collect();
    let target_parts: Vec<_> = target.components().collect();

    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &target_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

/// Distance between two directories: the number of path segments in either
/// that lie outside their common prefix. Identical paths have distance 0;
/// siblings have distance 2.
pub fn path_distance(a: &Path, b: &Path) -> usize {
    let a_norm = normalize(a);
    let b_norm = normalize(b);
    let a_parts: Vec<_> = a_norm.components().collect();
    let b_parts: Vec<_> = b_norm.components().collect();

    let common = a_parts
        .iter()
        .zip(b_parts.iter())
        .take_while(|(x, y)| x == y)
        .count();

    (a_parts.len() - common) + (b_parts.len() - common)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_and_dotdot() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize(Path::new("/a/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/./b")), PathBuf::from("a/b"));
    }

    #[test]
    fn normalize_keeps_leading_parent_components() {
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize(Path::new("a/../../x")), PathBuf::from("../x"));
    }

    #[test]
    fn forward_slashes() {
        assert_eq!(to_forward_slashes(Path::new("docs/notes/a.md")), "docs/notes/a.md");
    }

    #[test]
    fn relative_to_sibling_directory() {
        assert_eq!(
            relative_to(Path::new("/ws/docs"), Path::new("/ws/assets/img.png")),
            PathBuf::from("../assets/img.png")
        );
    }

    #[test]
    fn relative_to_child() {
        assert_eq!(
            relative_to(Path::new("/ws/docs"), Path::new("/ws/docs/img/a.png")),
            PathBuf::from("img/a.png")
        );
    }

    #[test]
    fn relative_to_same_directory() {
        assert_eq!(
            relative_to(Path::new("/ws/docs"), Path::new("/ws/docs/a.png")),
            PathBuf::from("a.png")
        );
    }

    #[test]
    fn distance_of_identical_paths_is_zero() {
        assert_eq!(path_distance(Path::new("/a/b"), Path::new("/a/b")), 0);
    }

    #[test]
    fn distance_counts_segments_outside_common_prefix() {
        // /ws/docs/a vs /ws/docs: one extra segment on the left.
        assert_eq!(path_distance(Path::new("/ws/docs/a"), Path::new("/ws/docs")), 1);
        // Siblings under /ws/docs.
        assert_eq!(
            path_distance(Path::new("/ws/docs/a"), Path::new("/ws/docs/b")),
            2
        );
        // Deeper divergence is further away.
        assert!(
            path_distance(Path::new("/ws/docs/a"), Path::new("/ws/other/deep/b"))
                > path_distance(Path::new("/ws/docs/a"), Path::new("/ws/docs/b"))
        );
    }
}
