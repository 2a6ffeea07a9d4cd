//! Watch-pattern generation from the destination rule table.
//!
//! The watcher cannot know, ahead of time, which document a paste will
//! target, so the per-document variables in each destination pattern are
//! widened to wildcards. The result is deliberately over-broad: a false
//! positive is filtered later by destination prediction, while an event a
//! pattern fails to cover is lost forever.

use markflow_config::DestinationRule;

/// Variables that widen to a single path segment.
const SEGMENT_VARIABLES: [&str; 4] = [
    "${documentFileName}",
    "${documentBaseName}",
    "${documentExtName}",
    "${documentDirName}",
];

/// Derive filesystem-watch glob patterns from the destination rules.
///
/// `image_extension_glob` is the `*.{png,…}` brace glob from the
/// configuration snapshot. With no rules configured a single catch-all
/// pattern covering every image extension is returned.
pub fn generate_watch_patterns(
    rules: &[DestinationRule],
    image_extension_glob: &str,
) -> Vec<String> {
    if rules.is_empty() {
        return vec![format!("**/{image_extension_glob}")];
    }

    let mut patterns: Vec<String> = Vec::new();
    for rule in rules {
        let mut pattern = rule.destination.clone();
        for variable in SEGMENT_VARIABLES {
            pattern = pattern.replace(variable, "*");
        }
        // The workspace folder is a path prefix, not a segment.
        pattern = pattern.replace("${documentWorkspaceFolder}", "**");
        pattern = pattern.replace("${fileName}", image_extension_glob);

        if pattern.ends_with('/') {
            pattern.push_str(image_extension_glob);
        }

        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }
    patterns
}
