//! Host that prints to the terminal, used by the `gotools` binary.

use std::path::PathBuf;

use crossterm::style::Stylize;
use gotools::host::{
  EditorHost,
  Target,
};
use gotools_lib::{
  buffer::ViewId,
  decoration::{
    Decoration,
    DecorationKind,
    Feature,
    Severity,
  },
};
use parking_lot::Mutex;

pub struct TerminalHost {
  path:     PathBuf,
  color:    bool,
  replaced: Mutex<Option<String>>,
}

impl TerminalHost {
  pub fn new(path: PathBuf, color: bool) -> Self {
    Self {
      path,
      color,
      replaced: Mutex::new(None),
    }
  }

  /// Text handed to `replace_text`, if any.
  pub fn take_replaced(&self) -> Option<String> {
    self.replaced.lock().take()
  }

  fn paint(&self, text: String, severity: Severity) -> String {
    match (self.color, severity) {
      (false, _) => text,
      (true, Severity::Error) => text.red().to_string(),
      (true, Severity::Warning) => text.yellow().to_string(),
    }
  }

  /// Gutter marks name the line, annotations point at the column.
  fn render(&self, decoration: &Decoration) -> String {
    let path = self.path.display();
    let row = decoration.position.row + 1;
    match decoration.kind {
      DecorationKind::GutterMark => {
        let severity = self.paint(decoration.severity.to_string(), decoration.severity);
        format!("{path}:{row}: {severity}")
      },
      DecorationKind::Annotation => {
        let annotation = self.paint(decoration.annotation(), decoration.severity);
        format!("{path}:{row}:{}: {annotation}", decoration.position.col + 1)
      },
    }
  }
}

impl EditorHost for TerminalHost {
  fn status_message(&self, message: &str) {
    eprintln!("{message}");
  }

  fn set_status(&self, _view: ViewId, _key: &str, text: &str) {
    if !text.is_empty() {
      println!("{text}");
    }
  }

  fn update_decorations(&self, _view: ViewId, _feature: Feature, decorations: Vec<Decoration>) {
    for decoration in &decorations {
      println!("{}", self.render(decoration));
    }
  }

  fn replace_text(&self, _view: ViewId, text: &str) {
    *self.replaced.lock() = Some(text.to_owned());
  }

  fn open_location(&self, target: &Target) {
    println!("{target}");
  }
}

#[cfg(test)]
mod tests {
  use gotools_lib::position::Position;

  use super::*;

  #[test]
  fn decorations_render_by_kind() {
    let host = TerminalHost::new(PathBuf::from("main.go"), false);
    let position = Position::new(2, 8);
    let mark = Decoration::new(position, Severity::Error, DecorationKind::GutterMark, "oops");
    let note = Decoration::new(position, Severity::Error, DecorationKind::Annotation, "oops");
    assert_eq!(host.render(&mark), "main.go:3: error");
    assert_eq!(host.render(&note), "main.go:3:9: ^ oops");
  }
}
