//! The editor side of the integration.

use std::{
  fmt,
  path::PathBuf,
};

use gotools_lib::{
  buffer::ViewId,
  decoration::{
    Decoration,
    Feature,
  },
};

/// Prefix for every user facing status message.
pub const STATUS_PREFIX: &str = "GoTools: ";

/// Services the embedding editor provides. Implementations must be callable
/// from the lint worker, hence `Send + Sync`.
pub trait EditorHost: Send + Sync {
  /// Transient message in the status bar.
  fn status_message(&self, message: &str);

  /// Persistent status bar slot for `view`; an empty `text` clears it.
  fn set_status(&self, view: ViewId, key: &str, text: &str);

  /// Replaces the whole decoration set of `feature` in `view`.
  fn update_decorations(&self, view: ViewId, feature: Feature, decorations: Vec<Decoration>);

  /// Replaces the buffer contents of `view`, e.g. with formatter output.
  fn replace_text(&self, view: ViewId, text: &str);

  /// Opens `target` and focuses it.
  fn open_location(&self, target: &Target);
}

/// A definition site, 1-based as reported by the tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  pub path: PathBuf,
  pub line: usize,
  pub col:  usize,
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.path.display(), self.line, self.col)
  }
}

pub(crate) fn status(host: &dyn EditorHost, message: impl fmt::Display) {
  host.status_message(&format!("{STATUS_PREFIX}{message}"));
}
