//! Destination prediction: where will the host editor save a pasted image?
//!
//! The host editor consults an ordered table of `glob -> destination`
//! rules; the first rule whose glob matches the document's
//! workspace-relative path decides the save location. With no matching
//! rule (or no rules at all) the image lands next to the document.
//! Prediction reproduces that decision without touching the filesystem,
//! so it always succeeds.

use globset::GlobBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use markflow_config::DestinationRule;

use crate::paths;
use crate::vars::PathVariables;

/// The outcome of predicting a save location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    /// Absolute, lexically normalized predicted path. When the matched
    /// pattern denoted a directory the image file name has already been
    /// appended.
    pub destination: PathBuf,

    /// Whether the matched destination pattern denoted a directory.
    pub is_directory: bool,

    /// The glob of the rule that matched, if any.
    pub matched_pattern: Option<String>,

    /// The variable set used during resolution.
    pub variables: PathVariables,
}

/// Predict the absolute path the host editor saves `image_file_name` to
/// when it is pasted into `document_path`.
///
/// Rules are evaluated in table order against the document's
/// workspace-relative path (forward slashes); the first match wins, even
/// when a later rule is more specific. A rule with an invalid glob is
/// skipped. Without a workspace root containing the document, or without
/// any matching rule, the prediction falls back to the document's own
/// directory.
pub fn predict(
    document_path: &Path,
    image_file_name: &str,
    rules: &[DestinationRule],
    workspace_root: Option<&Path>,
) -> Prediction {
    let variables = PathVariables::derive(document_path, image_file_name, workspace_root);
    let document_dir = document_path.parent().unwrap_or_else(|| Path::new(""));

    if let Some(relative) = workspace_relative(document_path, workspace_root) {
        for rule in rules {
            if !glob_matches(&rule.pattern, &relative) {
                continue;
            }

            let resolved = variables.resolve(&rule.destination);
            let is_directory = resolved.ends_with('/');
            let target = if is_directory {
                PathBuf::from(&resolved).join(image_file_name)
            } else {
                PathBuf::from(&resolved)
            };
            let absolute = if target.is_absolute() {
                target
            } else {
                document_dir.join(target)
            };

            return Prediction {
                destination: paths::normalize(&absolute),
                is_directory,
                matched_pattern: Some(rule.pattern.clone()),
                variables,
            };
        }
    }

    Prediction {
        destination: paths::normalize(&document_dir.join(image_file_name)),
        is_directory: false,
        matched_pattern: None,
        variables,
    }
}

/// Whether `actual` is exactly where prediction says the image for
/// `(document_path, image_file_name)` would be saved.
pub fn is_expected_path(
    actual: &Path,
    document_path: &Path,
    image_file_name: &str,
    rules: &[DestinationRule],
    workspace_root: Option<&Path>,
) -> bool {
    let predicted = predict(document_path, image_file_name, rules, workspace_root);
    paths::normalize(actual) == predicted.destination
}

fn workspace_relative(document_path: &Path, workspace_root: Option<&Path>) -> Option<String> {
    let root = workspace_root?;
    document_path
        .strip_prefix(root)
        .ok()
        .map(paths::to_forward_slashes)
}

fn glob_matches(pattern: &str, relative: &str) -> bool {
    match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => glob.compile_matcher().is_match(Path::new(relative)),
        Err(err) => {
            warn!("skipping destination rule with invalid glob '{pattern}': {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, destination: &str) -> DestinationRule {
        DestinationRule::new(pattern, destination)
    }

    #[test]
    fn no_rules_falls_back_to_document_directory() {
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &[],
            Some(Path::new("/ws")),
        );
        assert_eq!(prediction.destination, PathBuf::from("/ws/docs/img.png"));
        assert!(!prediction.is_directory);
        assert!(prediction.matched_pattern.is_none());
    }

    #[test]
    fn no_workspace_root_falls_back_even_with_rules() {
        let rules = [rule("**/*.md", "assets/")];
        let prediction = predict(Path::new("/ws/docs/note.md"), "img.png", &rules, None);
        assert_eq!(prediction.destination, PathBuf::from("/ws/docs/img.png"));
        assert!(prediction.matched_pattern.is_none());
    }

    #[test]
    fn directory_pattern_appends_image_name() {
        let rules = [rule("**/*.md", "assets/")];
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(prediction.destination, PathBuf::from("/ws/docs/assets/img.png"));
        assert!(prediction.is_directory);
        assert_eq!(prediction.matched_pattern.as_deref(), Some("**/*.md"));
    }

    #[test]
    fn file_pattern_is_taken_literally() {
        let rules = [rule("**/*.md", "media/${documentBaseName}-${fileName}")];
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(
            prediction.destination,
            PathBuf::from("/ws/docs/media/note-img.png")
        );
        assert!(!prediction.is_directory);
    }

    #[test]
    fn first_matching_rule_wins_over_more_specific_later_rule() {
        let rules = [
            rule("**/*.md", "general/"),
            rule("docs/**/*.md", "specific/"),
        ];
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(prediction.matched_pattern.as_deref(), Some("**/*.md"));
        assert_eq!(prediction.destination, PathBuf::from("/ws/docs/general/img.png"));
    }

    #[test]
    fn non_matching_rules_are_passed_over() {
        let rules = [
            rule("blog/**/*.md", "blog-assets/"),
            rule("docs/**/*.md", "doc-assets/"),
        ];
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(prediction.matched_pattern.as_deref(), Some("docs/**/*.md"));
    }

    #[test]
    fn workspace_folder_variable_yields_absolute_destination() {
        let rules = [rule("**/*.md", "${documentWorkspaceFolder}/media/")];
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(prediction.destination, PathBuf::from("/ws/media/img.png"));
    }

    #[test]
    fn relative_destination_with_parent_components_is_normalized() {
        let rules = [rule("**/*.md", "../shared/")];
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(prediction.destination, PathBuf::from("/ws/shared/img.png"));
    }

    #[test]
    fn invalid_glob_is_skipped() {
        let rules = [rule("docs/[", "broken/"), rule("**/*.md", "assets/")];
        let prediction = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(prediction.matched_pattern.as_deref(), Some("**/*.md"));
    }

    #[test]
    fn predict_is_pure() {
        let rules = [rule("**/*.md", "assets/${documentBaseName}/")];
        let a = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        let b = predict(
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn expected_path_accepts_unnormalized_actual() {
        let rules = [rule("**/*.md", "assets/")];
        assert!(is_expected_path(
            Path::new("/ws/docs/./assets/../assets/img.png"),
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        ));
        assert!(!is_expected_path(
            Path::new("/ws/docs/other/img.png"),
            Path::new("/ws/docs/note.md"),
            "img.png",
            &rules,
            Some(Path::new("/ws")),
        ));
    }
}
