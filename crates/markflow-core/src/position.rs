//! Line/column coordinates within document text.
//!
//! Lines are 0-based; columns are 0-based counts of characters (not bytes),
//! so coordinates stay meaningful for non-ASCII documents.

use serde::{Deserialize, Serialize};

/// A position in document text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// 0-based line number.
    pub line: u32,
    /// 0-based character offset within the line.
    pub column: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Range {
    /// Start of the range (inclusive).
    pub start: Position,
    /// End of the range (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// The position of `byte_offset` within `text`.
///
/// Offsets beyond the end of the text yield the position just past the
/// last character.
pub fn position_at(text: &str, byte_offset: usize) -> Position {
    let mut line = 0u32;
    let mut column = 0u32;
    for (index, ch) in text.char_indices() {
        if index >= byte_offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    Position { line, column }
}

/// The byte offset of `position` within `text`, clamped to line and text
/// bounds so a stale position never indexes out of range.
pub fn offset_at(text: &str, position: Position) -> usize {
    let mut current_line = 0u32;
    let mut current_column = 0u32;
    for (index, ch) in text.char_indices() {
        if current_line == position.line && current_column == position.column {
            return index;
        }
        if current_line > position.line {
            return index;
        }
        if ch == '\n' {
            if current_line == position.line {
                // Requested column lies past the end of this line.
                return index;
            }
            current_line += 1;
            current_column = 0;
        } else {
            current_column += 1;
        }
    }
    text.len()
}

/// Clamp `(line, column)` to the valid bounds of `text`.
pub fn clamp_position(text: &str, line: u32, column: u32) -> Position {
    let line_count = text.split('\n').count() as u32;
    let safe_line = line.min(line_count.saturating_sub(1));
    let line_text = text
        .split('\n')
        .nth(safe_line as usize)
        .unwrap_or_default();
    let safe_column = column.min(line_text.chars().count() as u32);
    Position {
        line: safe_line,
        column: safe_column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "first line\nsecond\n\nfourth";

    #[test]
    fn position_at_start() {
        assert_eq!(position_at(TEXT, 0), Position::new(0, 0));
    }

    #[test]
    fn position_at_crosses_lines() {
        let offset = TEXT.find("second").unwrap();
        assert_eq!(position_at(TEXT, offset), Position::new(1, 0));
        let offset = TEXT.find("fourth").unwrap();
        assert_eq!(position_at(TEXT, offset), Position::new(3, 0));
    }

    #[test]
    fn position_at_past_end() {
        assert_eq!(position_at(TEXT, TEXT.len() + 10), Position::new(3, 6));
    }

    #[test]
    fn position_counts_characters_not_bytes() {
        let text = "héllo x";
        let offset = text.find('x').unwrap();
        assert_eq!(position_at(text, offset), Position::new(0, 6));
    }

    #[test]
    fn offset_at_round_trips() {
        for probe in ["first", "second", "fourth"] {
            let offset = TEXT.find(probe).unwrap();
            assert_eq!(offset_at(TEXT, position_at(TEXT, offset)), offset);
        }
    }

    #[test]
    fn offset_at_clamps_overlong_column() {
        // Column 99 on line 1 ("second") clamps to the line's end.
        let offset = offset_at(TEXT, Position::new(1, 99));
        assert_eq!(offset, TEXT.find("second").unwrap() + "second".len());
    }

    #[test]
    fn clamp_within_bounds_is_identity() {
        assert_eq!(clamp_position(TEXT, 1, 3), Position::new(1, 3));
    }

    #[test]
    fn clamp_overlong_line_and_column() {
        assert_eq!(clamp_position(TEXT, 99, 99), Position::new(3, 6));
        assert_eq!(clamp_position(TEXT, 0, 99), Position::new(0, 10));
    }

    #[test]
    fn clamp_on_empty_text() {
        assert_eq!(clamp_position("", 5, 5), Position::new(0, 0));
    }
}
