//! go vet / golint integration with a debounced trigger on edits.

use std::{
  path::{
    Path,
    PathBuf,
  },
  sync::Arc,
  time::Duration,
};

use anyhow::{
  Context as _,
  Result,
};
use gotools_event::{
  AsyncHook,
  send_blocking,
};
use gotools_lib::{
  buffer::{
    Buffer,
    ViewId,
  },
  decoration::{
    Decoration,
    DecorationKind,
    Feature,
    Severity,
  },
  diagnostics::{
    self,
    FILE_LINE,
    FILE_LINE_COL,
    Pattern,
  },
};
use tokio::{
  task::JoinHandle,
  time::Instant,
};

use super::{
  Context,
  Hook,
};
use crate::{
  host::EditorHost,
  runner::{
    PreparedTool,
    ToolOutput,
    ToolRunner,
  },
};

/// Quiet period after the last edit before linting.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
enum Stream {
  Stdout,
  Stderr,
}

struct Linter {
  tool:    &'static str,
  args:    &'static [&'static str],
  pattern: &'static str,
  /// Whether the output contains findings.
  failed:  fn(&ToolOutput) -> bool,
  stream:  Stream,
}

const LINTERS: &[Linter] = &[
  Linter {
    tool:    "go",
    args:    &["vet"],
    pattern: FILE_LINE,
    failed:  |output| output.status == 1,
    stream:  Stream::Stderr,
  },
  Linter {
    tool:    "golint",
    args:    &[],
    pattern: FILE_LINE_COL,
    failed:  |output| !output.stdout.is_empty(),
    stream:  Stream::Stdout,
  },
];

/// One lint pass over a file, with its linters already resolved.
pub struct LintJob {
  view:      ViewId,
  dir:       PathBuf,
  file_name: String,
  linters:   Vec<(&'static Linter, PreparedTool, Pattern)>,
}

impl LintJob {
  /// Linters that are not installed are left out with a warning.
  pub fn prepare(runner: &ToolRunner, view: ViewId, path: &Path) -> Result<Self> {
    let dir = path
      .parent()
      .map(Path::to_path_buf)
      .with_context(|| format!("{} has no parent directory", path.display()))?;
    let file_name = path
      .file_name()
      .with_context(|| format!("{} has no file name", path.display()))?
      .to_string_lossy()
      .into_owned();

    let mut linters = Vec::new();
    for linter in LINTERS {
      match runner.prepare(linter.tool) {
        Ok(tool) => linters.push((linter, tool, Pattern::new(linter.pattern)?)),
        Err(err) => log::warn!("skipping {}: {err}", linter.tool),
      }
    }

    Ok(Self {
      view,
      dir,
      file_name,
      linters,
    })
  }

  /// Runs every linter and replaces the view's lint decorations once.
  /// Returns the number of decorations.
  pub fn run(&self, host: &dyn EditorHost) -> usize {
    log::info!("linting {}", self.dir.join(&self.file_name).display());

    let mut decorations = Vec::new();
    for (linter, tool, pattern) in &self.linters {
      let invocation = tool
        .invocation()
        .args(linter.args.iter().copied())
        .cwd(&self.dir);
      let output = match tool.run(invocation) {
        Ok(output) => output,
        Err(err) => {
          log::error!("{err}");
          continue;
        },
      };
      if !(linter.failed)(&output) {
        continue;
      }

      let findings = match linter.stream {
        Stream::Stdout => &output.stdout,
        Stream::Stderr => &output.stderr,
      };
      let correlation = diagnostics::correlate(findings, pattern, Some(&self.file_name));
      decorations.extend(
        correlation
          .diagnostics
          .iter()
          .map(|diagnostic| {
            Decoration::from_diagnostic(diagnostic, Severity::Warning, DecorationKind::Annotation)
          }),
      );
    }

    let count = decorations.len();
    host.update_decorations(self.view, Feature::Lint, decorations);
    count
  }
}

/// Lints `path` right away.
pub fn lint(host: &dyn EditorHost, runner: &ToolRunner, view: ViewId, path: &Path) -> Result<usize> {
  Ok(LintJob::prepare(runner, view, path)?.run(host))
}

#[derive(Debug)]
pub enum LintEvent {
  Modified,
  /// Lint as soon as no run is in flight.
  Saved,
}

/// Per-view debounce task. A burst of edits settles into one lint run once
/// no edit arrived for [`DEBOUNCE`]; a run never overlaps the previous one,
/// whether it was started by an edit or a save.
pub struct LintHook {
  job:       Arc<LintJob>,
  host:      Arc<dyn EditorHost>,
  in_flight: Option<JoinHandle<usize>>,
}

impl LintHook {
  pub fn new(job: LintJob, host: Arc<dyn EditorHost>) -> Self {
    Self {
      job: Arc::new(job),
      host,
      in_flight: None,
    }
  }
}

impl AsyncHook for LintHook {
  type Event = LintEvent;

  fn handle_event(&mut self, event: Self::Event, _timeout: Option<Instant>) -> Option<Instant> {
    match event {
      LintEvent::Modified => Some(Instant::now() + DEBOUNCE),
      LintEvent::Saved => Some(Instant::now()),
    }
  }

  fn finish_debounce(&mut self) -> Option<Instant> {
    if let Some(task) = &self.in_flight
      && !task.is_finished()
    {
      return Some(Instant::now() + DEBOUNCE);
    }

    let job = self.job.clone();
    let host = self.host.clone();
    self.in_flight = Some(tokio::task::spawn_blocking(move || job.run(host.as_ref())));
    None
  }
}

/// Lints on save and, debounced, on every edit. Both go through the view's
/// [`LintHook`].
pub struct LintOnEdit;

impl LintOnEdit {
  fn notify(cx: &mut Context, buffer: &Buffer, event: LintEvent) -> Result<()> {
    let Some(path) = buffer.path() else {
      return Ok(());
    };

    // a view that was saved under a new name gets a fresh hook
    let stale = cx
      .state
      .lint
      .as_ref()
      .is_none_or(|(linted, tx)| linted != path || tx.is_closed());
    if stale {
      let job = LintJob::prepare(cx.runner, buffer.id(), path)?;
      let tx = LintHook::new(job, cx.host.clone()).spawn_on(cx.runtime);
      cx.state.lint = Some((path.to_path_buf(), tx));
    }

    if let Some((_, tx)) = &cx.state.lint {
      send_blocking(tx, event);
    }
    Ok(())
  }
}

impl Hook for LintOnEdit {
  fn name(&self) -> &'static str {
    "lint"
  }

  fn on_save(&self, cx: &mut Context, buffer: &Buffer) -> Result<()> {
    if !cx.settings.lint_on_save {
      return Ok(());
    }
    Self::notify(cx, buffer, LintEvent::Saved)
  }

  fn on_modified(&self, cx: &mut Context, buffer: &Buffer) -> Result<()> {
    if !cx.settings.lint_on_modified {
      return Ok(());
    }
    Self::notify(cx, buffer, LintEvent::Modified)
  }
}
