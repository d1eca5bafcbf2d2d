//! gofmt / goimports integration.

use anyhow::Result;
use gotools_lib::{
  buffer::Buffer,
  decoration::{
    Decoration,
    DecorationKind,
    Feature,
    Severity,
  },
  diagnostics::{
    self,
    ANY_FILE_LINE_COL,
    Pattern,
  },
};

use super::{
  Context,
  Hook,
};
use crate::{
  host::EditorHost,
  runner::ToolRunner,
  settings::FormatBackend,
};

/// Exit code gofmt and goimports use for syntax errors.
const SYNTAX_ERROR: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
  /// The formatter accepted the buffer; this is its output.
  Formatted(String),
  /// The buffer has this many syntax errors, each shown as a gutter mark
  /// and an annotation.
  SyntaxErrors(usize),
  /// The formatter exited with an unexpected status.
  Failed(i32),
}

fn steps(backend: FormatBackend) -> &'static [(&'static str, &'static [&'static str])] {
  const GOFMT: (&str, &[&str]) = ("gofmt", &["-e", "-s"]);
  const GOIMPORTS: (&str, &[&str]) = ("goimports", &["-e"]);
  match backend {
    FormatBackend::Gofmt => &[GOFMT],
    FormatBackend::Goimports => &[GOIMPORTS],
    FormatBackend::Both => &[GOIMPORTS, GOFMT],
  }
}

/// Formats `buffer` with the configured backend. Each step gets the output
/// of the previous one and is checked on its own; the first failing step
/// ends the run. On success the host text is replaced when it changed.
pub fn format(
  host: &dyn EditorHost,
  runner: &ToolRunner,
  backend: FormatBackend,
  buffer: &Buffer,
) -> Result<FormatOutcome> {
  let view = buffer.id();
  let original = String::from_utf8(buffer.contents())?;
  let mut text = original.clone();

  for (tool, args) in steps(backend) {
    let output = runner.run(
      runner
        .invocation(tool)
        .args(args.iter().copied())
        .stdin(text.into_bytes()),
    )?;

    match output.status {
      0 => text = output.stdout,
      SYNTAX_ERROR => {
        let pattern = Pattern::new(ANY_FILE_LINE_COL)?;
        let errors = diagnostics::correlate(&output.stderr, &pattern, None).diagnostics;
        // every error is marked in the gutter and explained below its line
        let decorations = errors
          .iter()
          .flat_map(|error| {
            [DecorationKind::GutterMark, DecorationKind::Annotation]
              .map(|kind| Decoration::from_diagnostic(error, Severity::Error, kind))
          })
          .collect();
        host.update_decorations(view, Feature::Format, decorations);
        let count = errors.len();
        return Ok(FormatOutcome::SyntaxErrors(count));
      },
      status => {
        log::error!("unknown {tool} error ({status}) stderr:\n{}", output.stderr);
        host.update_decorations(view, Feature::Format, Vec::new());
        return Ok(FormatOutcome::Failed(status));
      },
    }
  }

  host.update_decorations(view, Feature::Format, Vec::new());
  if text != original {
    host.replace_text(view, &text);
  }
  Ok(FormatOutcome::Formatted(text))
}

pub struct FormatHook;

impl Hook for FormatHook {
  fn name(&self) -> &'static str {
    "format"
  }

  fn on_save(&self, cx: &mut Context, buffer: &Buffer) -> Result<()> {
    if !cx.settings.format_on_save {
      return Ok(());
    }
    format(
      cx.host.as_ref(),
      cx.runner,
      cx.settings.format_backend,
      buffer,
    )?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn both_runs_goimports_first() {
    let tools: Vec<_> = steps(FormatBackend::Both)
      .iter()
      .map(|(tool, _)| *tool)
      .collect();
    assert_eq!(tools, ["goimports", "gofmt"]);
    assert_eq!(steps(FormatBackend::Gofmt)[0].1, ["-e", "-s"]);
  }
}
