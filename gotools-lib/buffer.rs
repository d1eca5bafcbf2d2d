//! Snapshot of an editor view handed to the Go tool handlers.

use std::{
  fmt,
  path::{
    Path,
    PathBuf,
  },
};

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::{
  Rope,
  RopeSlice,
};

use crate::position::{
  Position,
  coords_at_pos,
};

/// Identity of an editor view. Per-view state is keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "view#{}", self.0)
  }
}

/// A selection range in char indices. `anchor` may be past `head`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  pub fn point(pos: usize) -> Self {
    Self::new(pos, pos)
  }

  pub fn from(&self) -> usize {
    self.anchor.min(self.head)
  }

  pub fn to(&self) -> usize {
    self.anchor.max(self.head)
  }
}

/// A cursor or mouse location resolved against a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  pub path:       Option<PathBuf>,
  pub position:   Position,
  /// Byte offset of the location start.
  pub offset:     usize,
  /// Byte offset of the selection end; equals `offset` for mouse events.
  pub end_offset: usize,
}

#[derive(Debug, Clone)]
pub struct Buffer {
  id:        ViewId,
  path:      Option<PathBuf>,
  text:      Rope,
  selection: Range,
}

impl Buffer {
  pub fn new(id: ViewId, path: Option<PathBuf>, text: &str) -> Self {
    Self {
      id,
      path,
      text: Rope::from_str(text),
      selection: Range::default(),
    }
  }

  pub fn with_selection(mut self, selection: Range) -> Self {
    self.set_selection(selection);
    self
  }

  pub fn set_selection(&mut self, selection: Range) {
    let len = self.text.len_chars();
    self.selection = Range::new(selection.anchor.min(len), selection.head.min(len));
  }

  pub fn id(&self) -> ViewId {
    self.id
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub fn text(&self) -> RopeSlice<'_> {
    self.text.slice(..)
  }

  pub fn selection(&self) -> Range {
    self.selection
  }

  /// Only `.go` files are handled.
  pub fn is_go_source(&self) -> bool {
    self
      .path
      .as_deref()
      .and_then(Path::extension)
      .is_some_and(|ext| ext == "go")
  }

  /// Full buffer contents as UTF-8, ready to be piped into a tool.
  pub fn contents(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(self.text.len_bytes());
    for chunk in self.text.chunks() {
      bytes.extend_from_slice(chunk.as_bytes());
    }
    bytes
  }

  pub fn byte_offset(&self, char_idx: usize) -> usize {
    self.text.char_to_byte(char_idx.min(self.text.len_chars()))
  }

  /// Byte offsets of the primary selection start and end.
  pub fn offset_at_cursor(&self) -> (usize, usize) {
    (
      self.byte_offset(self.selection.from()),
      self.byte_offset(self.selection.to()),
    )
  }

  /// Char range of the identifier touching the primary selection.
  pub fn word_range_at_cursor(&self) -> (usize, usize) {
    let text = self.text.slice(..);
    let mut start = self.selection.from();
    while start > 0 && char_is_word(text.char(start - 1)) {
      start -= 1;
    }
    let mut end = self.selection.to();
    while end < text.len_chars() && char_is_word(text.char(end)) {
      end += 1;
    }
    (start, end)
  }

  /// Byte offsets of the identifier touching the primary selection.
  pub fn symbol_offset_at_cursor(&self) -> (usize, usize) {
    let (start, end) = self.word_range_at_cursor();
    (self.byte_offset(start), self.byte_offset(end))
  }

  pub fn word_at_cursor(&self) -> String {
    let (start, end) = self.word_range_at_cursor();
    self.text.slice(start..end).to_string()
  }

  pub fn location_at_cursor(&self) -> Location {
    let (offset, end_offset) = self.offset_at_cursor();
    Location {
      path: self.path.clone(),
      position: coords_at_pos(self.text(), self.selection.from()),
      offset,
      end_offset,
    }
  }

  /// Location for a mouse event the host already resolved to a char index.
  pub fn location_at(&self, char_idx: usize) -> Location {
    let char_idx = char_idx.min(self.text.len_chars());
    let offset = self.byte_offset(char_idx);
    Location {
      path: self.path.clone(),
      position: coords_at_pos(self.text(), char_idx),
      offset,
      end_offset: offset,
    }
  }

  /// Name of the `Test*` function enclosing the cursor, if any.
  pub fn test_name_at_cursor(&self) -> Option<String> {
    static TEST_FUNC: Lazy<Regex> = Lazy::new(|| {
      Regex::new(r"^func\s*(?:\([^)]*\)\s*)?(Test\w*)\s*\(").expect("test func regex should compile")
    });

    let cursor_line = self.text.char_to_line(self.selection.from());
    for line_idx in (0..=cursor_line).rev() {
      let line = self.text.line(line_idx).to_string();
      if line.starts_with("func") {
        return TEST_FUNC
          .captures(&line)
          .and_then(|caps| caps.get(1))
          .map(|name| name.as_str().to_owned());
      }
      // a closing brace in the first column ends the previous declaration
      if line.starts_with('}') && line_idx != cursor_line {
        return None;
      }
    }
    None
  }
}

fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}
