use ropey::RopeSlice;
use serde::{
  Deserialize,
  Serialize,
};

/// This is a single point in a text buffer.
/// 0-indexed, columns count chars.
#[derive(
  Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
  pub row: usize,
  pub col: usize,
}

impl Position {
  pub const fn new(row: usize, col: usize) -> Self {
    Self { row, col }
  }

  /// Converts 1-based tool coordinates, as printed by `file:line:col`
  /// diagnostics, into a position.
  pub const fn from_one_based(line: usize, col: usize) -> Self {
    Self::new(line.saturating_sub(1), col.saturating_sub(1))
  }
}

/// Converts a char index into a `Position`.
pub fn coords_at_pos(text: RopeSlice, pos: usize) -> Position {
  let pos = pos.min(text.len_chars());
  let line = text.char_to_line(pos);
  Position::new(line, pos - text.line_to_char(line))
}

/// Convert a `(row, column)` to a char index.
///
/// If `row` exceeds the number of lines, the last line is used.
/// If `col` exceeds the length of the line, the line end (before the line
/// break) is used.
pub fn char_idx_at_coords(text: RopeSlice, coords: Position) -> usize {
  let line = coords.row.min(text.len_lines().saturating_sub(1));
  let line_start = text.line_to_char(line);
  let line_len = text
    .line(line)
    .chars()
    .take_while(|ch| *ch != '\n' && *ch != '\r')
    .count();
  line_start + coords.col.min(line_len)
}
