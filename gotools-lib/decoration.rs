//! Decorations are the only thing handlers draw into a view. Each feature
//! owns one decoration set per view and always replaces it as a whole.

use std::{
  collections::HashMap,
  fmt,
};

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  buffer::ViewId,
  diagnostics::Diagnostic,
  position::Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Error,
  Warning,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Error => f.write_str("error"),
      Self::Warning => f.write_str("warning"),
    }
  }
}

/// How a host draws a decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
  /// Message text drawn below the offending position.
  Annotation,
  /// An icon in the gutter of the offending line.
  GutterMark,
}

/// The feature a decoration set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
  Format,
  Lint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
  pub position: Position,
  pub severity: Severity,
  pub kind:     DecorationKind,
  pub message:  String,
}

impl Decoration {
  pub fn new(
    position: Position,
    severity: Severity,
    kind: DecorationKind,
    message: impl Into<String>,
  ) -> Self {
    Self {
      position,
      severity,
      kind,
      message: message.into(),
    }
  }

  pub fn from_diagnostic(diagnostic: &Diagnostic, severity: Severity, kind: DecorationKind) -> Self {
    Self::new(diagnostic.position, severity, kind, diagnostic.message.clone())
  }

  /// Inline annotation text placed below the offending line.
  pub fn annotation(&self) -> String {
    format!("^ {}", self.message)
  }
}

/// Decoration sets keyed by view and feature.
#[derive(Debug, Default)]
pub struct DecorationStore {
  sets: HashMap<(ViewId, Feature), Vec<Decoration>>,
}

impl DecorationStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replaces the whole set for `(view, feature)`. An empty set removes it.
  pub fn replace(&mut self, view: ViewId, feature: Feature, decorations: Vec<Decoration>) {
    if decorations.is_empty() {
      self.sets.remove(&(view, feature));
    } else {
      self.sets.insert((view, feature), decorations);
    }
  }

  pub fn get(&self, view: ViewId, feature: Feature) -> &[Decoration] {
    self
      .sets
      .get(&(view, feature))
      .map(Vec::as_slice)
      .unwrap_or_default()
  }
}
