//! Fuzzy location and rewriting of image references.
//!
//! The on-disk path recorded at capture time can differ cosmetically from
//! how the reference appears in the document (relative vs. absolute, `./`
//! prefix, a path the user has hand-edited), so the reference is located
//! by trying several pattern classes in priority order and scoring every
//! occurrence the winning class finds.

use regex::Regex;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::links;
use crate::paths;
use crate::position::{clamp_position, offset_at, position_at, Position, Range};

/// Additive weights used to rank candidate occurrences.
///
/// Heuristic constants, not invariants; tests pin the current tie-break
/// order.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    /// The occurrence's file name equals the captured image's file name.
    pub file_name_exact: i32,
    /// The occurrence's path contains the image file name.
    pub contains_file_name: i32,
    /// The occurrence's path contains the document-relative image path.
    pub contains_relative_path: i32,
}

/// The weights currently in effect.
pub const SCORE_WEIGHTS: ScoreWeights = ScoreWeights {
    file_name_exact: 100,
    contains_file_name: 50,
    contains_relative_path: 75,
};

/// An image reference located in document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Line/column range of the full `![alt](path)` reference.
    pub range: Range,

    /// Byte offsets of the reference within the text it was found in.
    pub byte_range: (usize, usize),

    /// The alt text, verbatim.
    pub alt_text: String,

    /// The path as written in the document.
    pub original_path: String,

    /// The occurrence's ranking score.
    pub score: i32,
}

/// A computed replacement for one image reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewriteEdit {
    /// Range of the text to replace.
    pub range: Range,

    /// Replacement text, `![alt](remote_url)` with the alt text preserved.
    pub new_text: String,

    /// The preserved alt text.
    pub alt_text: String,

    /// The path the reference previously pointed at.
    pub original_path: String,

    /// Where the cursor belongs after the edit: the end of the inserted
    /// reference. Clamp against the live document before use.
    pub cursor: Position,
}

/// Locate the reference to `local_image_path` inside `text`.
///
/// Pattern classes are tried in priority order: the document-relative
/// path, the bare file name, then a `./`-prefixed file name. Within the
/// first class that matches anything, every occurrence is scored with
/// [`SCORE_WEIGHTS`] and the highest score wins; ties keep the first
/// occurrence in document order. When no class matches at all, the last
/// local image reference in the document is returned — during a slow
/// upload the user has often kept typing below the original paste point.
pub fn find_reference(
    text: &str,
    document_path: &Path,
    local_image_path: &Path,
) -> Option<ImageReference> {
    let file_name = local_image_path.file_name()?.to_string_lossy().into_owned();
    let document_dir = document_path.parent().unwrap_or_else(|| Path::new(""));
    let relative = paths::to_forward_slashes(&paths::relative_to(document_dir, local_image_path));

    let classes = [
        format!(
            r"!\[([^\]]*)\]\(([^)]*{}[^)]*)\)",
            regex::escape(&relative)
        ),
        format!(
            r"!\[([^\]]*)\]\(([^)]*{}[^)]*)\)",
            regex::escape(&file_name)
        ),
        format!(
            r"!\[([^\]]*)\]\((\./[^)]*{}[^)]*)\)",
            regex::escape(&file_name)
        ),
    ];

    for pattern in &classes {
        let Ok(regex) = Regex::new(pattern) else {
            continue;
        };
        if let Some(reference) = best_match(text, &regex, &file_name, &relative) {
            return Some(reference);
        }
    }

    last_local_reference(text, &file_name, &relative)
}

/// Compute the edit replacing the reference to `local_image_path` with
/// `remote_url`.
pub fn rewrite(
    text: &str,
    document_path: &Path,
    local_image_path: &Path,
    remote_url: &str,
) -> Result<RewriteEdit> {
    let reference = find_reference(text, document_path, local_image_path).ok_or_else(|| {
        Error::ReferenceNotFound(local_image_path.to_string_lossy().into_owned())
    })?;

    let new_text = format!("![{}]({})", reference.alt_text, remote_url);
    let cursor = Position::new(
        reference.range.start.line,
        reference.range.start.column + new_text.chars().count() as u32,
    );

    Ok(RewriteEdit {
        range: reference.range,
        new_text,
        alt_text: reference.alt_text,
        original_path: reference.original_path,
        cursor,
    })
}

/// Apply an edit to document text, returning the new text and the cursor
/// position clamped to its bounds.
///
/// The edit's range is resolved against `text` as it is now; offsets are
/// clamped, so applying a stale edit cannot panic.
pub fn apply(text: &str, edit: &RewriteEdit) -> (String, Position) {
    let start = offset_at(text, edit.range.start);
    let end = offset_at(text, edit.range.end).max(start);

    let mut result = String::with_capacity(text.len() + edit.new_text.len());
    result.push_str(&text[..start]);
    result.push_str(&edit.new_text);
    result.push_str(&text[end..]);

    let cursor = clamp_position(&result, edit.cursor.line, edit.cursor.column);
    (result, cursor)
}

fn best_match(
    text: &str,
    regex: &Regex,
    file_name: &str,
    relative: &str,
) -> Option<ImageReference> {
    let mut best: Option<ImageReference> = None;
    for captures in regex.captures_iter(text) {
        let full = captures.get(0).expect("match has a full capture");
        let path = captures[2].to_string();
        let score = score_occurrence(&path, file_name, relative);
        // Strictly-greater keeps the first occurrence on ties.
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(ImageReference {
                range: Range::new(position_at(text, full.start()), position_at(text, full.end())),
                byte_range: (full.start(), full.end()),
                alt_text: captures[1].to_string(),
                original_path: path,
                score,
            });
        }
    }
    best
}

fn score_occurrence(path: &str, file_name: &str, relative: &str) -> i32 {
    let mut score = 0;
    let path_file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if path_file_name == file_name {
        score += SCORE_WEIGHTS.file_name_exact;
    }
    if path.contains(file_name) {
        score += SCORE_WEIGHTS.contains_file_name;
    }
    if path.contains(relative) {
        score += SCORE_WEIGHTS.contains_relative_path;
    }
    score
}

fn last_local_reference(text: &str, file_name: &str, relative: &str) -> Option<ImageReference> {
    links::find_image_links(text)
        .into_iter()
        .filter(|link| link.is_local)
        .next_back()
        .map(|link| {
            let score = score_occurrence(&link.path, file_name, relative);
            ImageReference {
                range: link.range,
                byte_range: link.byte_range,
                alt_text: link.alt_text,
                original_path: link.path,
                score,
            }
        })
}
