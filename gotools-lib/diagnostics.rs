//! Correlates line oriented tool output (`file:line[:col]:message`) with
//! positions in the current buffer.

use std::path::{
  Path,
  PathBuf,
};

use regex::Regex;

use crate::position::Position;

/// `file:line:col:message`, as printed by gofmt, goimports and golint.
pub const FILE_LINE_COL: &str = r"^(.*\.go):(\d+):(\d+):(.*)$";

/// `file:line:message`, as printed by go vet.
pub const FILE_LINE: &str = r"^(.*\.go):(\d+):(.*)$";

/// `file:line:col:message` for any file name; gofmt reports buffers piped
/// on stdin as `<standard input>`.
pub const ANY_FILE_LINE_COL: &str = r"^(.*):(\d+):(\d+):(.*)$";

/// A compiled diagnostic line pattern.
///
/// Group 1 is the file, group 2 the 1-based line, the last group the message.
/// When the pattern has four groups, group 3 is the 1-based column.
#[derive(Debug, Clone)]
pub struct Pattern {
  regex: Regex,
}

impl Pattern {
  pub fn new(pattern: &str) -> Result<Self, regex::Error> {
    Regex::new(pattern).map(|regex| Self { regex })
  }

  fn has_column(&self) -> bool {
    // group 0 plus file, line, col, message
    self.regex.captures_len() == 5
  }

  fn parse(&self, line: &str) -> Option<Diagnostic> {
    let caps = self.regex.captures(line)?;
    let group_count = self.regex.captures_len();
    let path = caps.get(1)?.as_str();
    let row: usize = caps.get(2)?.as_str().parse().ok()?;
    let col: usize = if self.has_column() {
      caps.get(3)?.as_str().parse().ok()?
    } else {
      1
    };
    let message = caps.get(group_count - 1)?.as_str().trim();

    Some(Diagnostic {
      path:     PathBuf::from(path),
      position: Position::from_one_based(row, col),
      message:  message.to_owned(),
    })
  }
}

/// A single parsed tool finding, positions already 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub path:     PathBuf,
  pub position: Position,
  pub message:  String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Correlation {
  pub diagnostics: Vec<Diagnostic>,
  /// Lines that looked relevant but did not match the pattern.
  pub skipped:     usize,
}

/// Parses `output` line by line.
///
/// With `file_name` set, lines not naming that file are ignored entirely,
/// so `domain.go` never matches `main.go`. Lines that name it but do not
/// match the pattern are logged and counted.
pub fn correlate(output: &str, pattern: &Pattern, file_name: Option<&str>) -> Correlation {
  let mut correlation = Correlation::default();

  for line in output.lines() {
    if line.trim().is_empty() {
      continue;
    }
    if let Some(file_name) = file_name
      && !names_file(line, file_name)
    {
      continue;
    }

    match pattern.parse(line) {
      Some(diagnostic)
        if file_name.is_some_and(|name| {
          diagnostic.path.file_name() != Some(Path::new(name).as_os_str())
        }) => {},
      Some(diagnostic) => correlation.diagnostics.push(diagnostic),
      None => {
        log::debug!("skipping unrecognizable error: {line}");
        correlation.skipped += 1;
      },
    }
  }

  correlation
}

/// Whether `line` mentions `file_name` as a whole path component.
fn names_file(line: &str, file_name: &str) -> bool {
  line.match_indices(file_name).any(|(start, _)| {
    line[..start]
      .chars()
      .next_back()
      .is_none_or(|c| matches!(c, '/' | '\\') || c.is_whitespace())
  })
}
