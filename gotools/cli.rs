use std::{
  path::{
    Path,
    PathBuf,
  },
  str::FromStr,
};

use anyhow::{
  Context,
  Result,
};
use clap::{
  ArgAction,
  Parser,
  Subcommand,
};
use gotools_lib::{
  Rope,
  buffer::{
    Buffer,
    Range,
    ViewId,
  },
  position::{
    Position,
    char_idx_at_coords,
  },
};

#[derive(Parser, Debug)]
#[command(name = "gotools", about, long_about = None, version)]
pub struct Cli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  pub verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  pub log_file: Option<PathBuf>,

  /// Load global settings from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  pub config_file: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Format a file with the configured backend
  Fmt {
    file:  PathBuf,
    /// Write the result back instead of printing it
    #[arg(short, long)]
    write: bool,
  },
  /// Run go vet and golint over a file
  Lint { file: PathBuf },
  /// Print the definition of the symbol at a position
  Def { file: PathBuf, position: Cursor },
  /// List completions at a position
  Complete { file: PathBuf, position: Cursor },
  /// Print the type of the identifier at a position
  Type { file: PathBuf, position: Cursor },
  /// Print the name of the test function enclosing a position
  TestName { file: PathBuf, position: Cursor },
  /// Check which tools are installed and where settings live
  Health,
}

/// A cursor given on the command line: `LINE:COL` (1-based) or `#BYTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
  Coords(Position),
  Byte(usize),
}

impl FromStr for Cursor {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if let Some(byte) = s.strip_prefix('#') {
      return byte
        .parse()
        .map(Self::Byte)
        .map_err(|_| format!("invalid byte offset '{byte}'"));
    }
    let (line, col) = s
      .split_once(':')
      .ok_or_else(|| format!("expected LINE:COL or #BYTE, got '{s}'"))?;
    let line: usize = line.parse().map_err(|_| format!("invalid line '{line}'"))?;
    let col: usize = col.parse().map_err(|_| format!("invalid column '{col}'"))?;
    Ok(Self::Coords(Position::from_one_based(line, col)))
  }
}

impl Cursor {
  pub fn char_idx(self, text: &Rope) -> usize {
    match self {
      Self::Coords(position) => char_idx_at_coords(text.slice(..), position),
      Self::Byte(byte) => text.byte_to_char(byte.min(text.len_bytes())),
    }
  }
}

/// Loads `file` into a buffer with the cursor at `cursor`.
pub fn load_buffer(file: &Path, cursor: Option<Cursor>) -> Result<Buffer> {
  let text = std::fs::read_to_string(file)
    .with_context(|| format!("failed to read {}", file.display()))?;
  let path = gotools_stdx::path::canonicalize(file);
  let mut buffer = Buffer::new(ViewId(1), Some(path), &text);
  if let Some(cursor) = cursor {
    let char_idx = cursor.char_idx(&Rope::from_str(&text));
    buffer.set_selection(Range::point(char_idx));
  }
  Ok(buffer)
}

fn parse_pathbuf(value: &str) -> Result<PathBuf, String> {
  Ok(gotools_stdx::path::canonicalize(value))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_cursor_arguments() {
    assert_eq!("3:7".parse::<Cursor>(), Ok(Cursor::Coords(Position::new(2, 6))));
    assert_eq!("#42".parse::<Cursor>(), Ok(Cursor::Byte(42)));
    assert!("3".parse::<Cursor>().is_err());
    assert!("#x".parse::<Cursor>().is_err());
    assert!("a:1".parse::<Cursor>().is_err());
  }

  #[test]
  fn byte_cursor_lands_on_char_boundary() {
    let text = Rope::from_str("// é\nx");
    // byte 4 is inside 'é'
    assert_eq!(Cursor::Byte(4).char_idx(&text), 3);
    assert_eq!(Cursor::Byte(100).char_idx(&text), text.len_chars());
    assert_eq!(Cursor::Coords(Position::new(1, 0)).char_idx(&text), 5);
  }

  #[test]
  fn cli_shape() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
  }
}
