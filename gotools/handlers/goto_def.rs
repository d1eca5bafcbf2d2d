//! Jump to the definition of the symbol under the cursor or mouse.

use std::path::{
  Path,
  PathBuf,
};

use gotools_lib::buffer::{
  Buffer,
  Location,
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
  host::{
    self,
    EditorHost,
    Target,
  },
  runner::{
    ToolError,
    ToolRunner,
  },
  settings::{
    GODEF,
    ORACLE,
    Settings,
  },
};

#[derive(Debug, Error)]
pub enum DefinitionError {
  #[error("invalid goto-def backend '{0}' (supported: godef, oracle)")]
  InvalidBackend(String),
  #[error("no definition found")]
  NotFound,
  #[error("file indicated by {backend} not found: {}", .path.display())]
  MissingFile { backend: String, path: PathBuf },
  #[error("buffer has no file name")]
  Unsaved,
  #[error(transparent)]
  Tool(#[from] ToolError),
  #[error("malformed oracle output: {0}")]
  Json(#[from] serde_json::Error),
}

impl DefinitionError {
  /// Short text for the status bar; the details go to the log.
  pub fn status(&self) -> String {
    match self {
      Self::InvalidBackend(_) => "Invalid godef configuration; see log for details".to_owned(),
      Self::MissingFile { backend, .. } => {
        format!("{backend} failed: Please enable debugging and check the log")
      },
      Self::Tool(err) if err.is_timeout() => "definition lookup timed out".to_owned(),
      err => err.to_string(),
    }
  }
}

/// Resolves the definition site without touching the editor.
pub fn find_definition(
  runner: &ToolRunner,
  settings: &Settings,
  location: &Location,
) -> Result<Target, DefinitionError> {
  let backend = settings.goto_def_backend();
  let path = location.path.as_deref().ok_or(DefinitionError::Unsaved)?;

  let target = match backend {
    GODEF => godef(runner, path, location.offset)?,
    ORACLE => oracle(runner, settings, path, location.offset)?,
    other => return Err(DefinitionError::InvalidBackend(other.to_owned())),
  };

  if !target.path.is_file() {
    return Err(DefinitionError::MissingFile {
      backend: backend.to_owned(),
      path:    target.path,
    });
  }
  Ok(target)
}

/// Resolves the definition and opens it in the host.
pub fn goto_definition(
  host: &dyn EditorHost,
  runner: &ToolRunner,
  settings: &Settings,
  buffer: &Buffer,
  mouse: Option<usize>,
) -> Result<Target, DefinitionError> {
  let location = match mouse {
    Some(char_idx) => buffer.location_at(char_idx),
    None => buffer.location_at_cursor(),
  };

  let target = find_definition(runner, settings, &location).inspect_err(|err| {
    log::warn!("goto definition failed: {err}");
    host::status(host, err.status());
  })?;

  log::info!("opening definition at {target}");
  host.open_location(&target);
  Ok(target)
}

fn godef(runner: &ToolRunner, path: &Path, offset: usize) -> Result<Target, DefinitionError> {
  let output = runner.run(runner.invocation("godef").args([
    "-f".to_owned(),
    path.display().to_string(),
    "-o".to_owned(),
    offset.to_string(),
  ]))?;
  if !output.success() {
    return Err(DefinitionError::NotFound);
  }

  log::debug!("godef output:\n{}", output.stdout.trim_end());
  parse_position(output.stdout.trim_end()).ok_or(DefinitionError::NotFound)
}

#[derive(Debug, Deserialize)]
struct OracleOutput {
  definition: OracleDefinition,
}

#[derive(Debug, Deserialize)]
struct OracleDefinition {
  objpos: String,
}

fn oracle(
  runner: &ToolRunner,
  settings: &Settings,
  path: &Path,
  offset: usize,
) -> Result<Target, DefinitionError> {
  let invocation = runner
    .invocation("oracle")
    .arg(format!("-pos={}:#{offset}", path.display()))
    .args(["-format=json", "definition"])
    .args(settings.package_scope());
  let output = runner.run(invocation)?;
  if !output.success() {
    return Err(DefinitionError::NotFound);
  }

  log::debug!("oracle output:\n{}", output.stdout.trim_end());
  let parsed: OracleOutput = serde_json::from_str(output.stdout.trim_end())?;
  parse_position(&parsed.definition.objpos).ok_or(DefinitionError::NotFound)
}

/// Parses `file:line:col`; the file is everything before the last two colons.
fn parse_position(location: &str) -> Option<Target> {
  let mut parts = location.rsplitn(3, ':');
  let col = parts.next()?.trim().parse().ok()?;
  let line = parts.next()?.trim().parse().ok()?;
  let path = parts.next()?;
  if path.is_empty() {
    return None;
  }
  Some(Target {
    path: PathBuf::from(path),
    line,
    col,
  })
}
