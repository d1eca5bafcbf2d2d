use std::{
  collections::HashMap,
  sync::Arc,
};

use anyhow::Result;
use gotools_lib::buffer::{
  Buffer,
  ViewId,
};
use tokio::runtime::{
  self,
  Handle,
  Runtime,
};

use crate::{
  handlers::{
    self,
    Completions,
    Context,
    Hook,
    ViewState,
    format::FormatOutcome,
    goto_def::DefinitionError,
  },
  host::{
    self,
    EditorHost,
    Target,
  },
  runner::{
    ToolError,
    ToolRunner,
  },
  settings::Settings,
};

/// Entry point for an embedding editor. Routes editor events to the
/// registered hooks and keeps the per-view state between events.
pub struct GoTools {
  host:     Arc<dyn EditorHost>,
  settings: Arc<Settings>,
  runner:   Arc<ToolRunner>,
  hooks:    Vec<Box<dyn Hook>>,
  views:    HashMap<ViewId, ViewState>,
  runtime:  Handle,
  /// Set when no runtime was running at construction.
  owned:    Option<Runtime>,
}

impl GoTools {
  pub fn new(host: Arc<dyn EditorHost>, settings: Settings) -> Result<Self, ToolError> {
    Self::with_hooks(host, settings, handlers::default_hooks())
  }

  pub fn with_hooks(
    host: Arc<dyn EditorHost>,
    settings: Settings,
    hooks: Vec<Box<dyn Hook>>,
  ) -> Result<Self, ToolError> {
    let runner = ToolRunner::new(&settings)?;
    log::debug!(
      "tool search path: {}",
      runner.search_path().to_string_lossy()
    );
    let (runtime, owned) = match Handle::try_current() {
      Ok(handle) => (handle, None),
      Err(_) => {
        log::debug!("no tokio runtime, starting one for debounced hooks");
        let owned = runtime::Builder::new_multi_thread()
          .worker_threads(1)
          .thread_name("gotools-hooks")
          .enable_time()
          .build()
          .map_err(ToolError::Runtime)?;
        (owned.handle().clone(), Some(owned))
      },
    };
    Ok(Self {
      host,
      settings: Arc::new(settings),
      runner: Arc::new(runner),
      hooks,
      views: HashMap::new(),
      runtime,
      owned,
    })
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn runner(&self) -> &ToolRunner {
    &self.runner
  }

  pub fn on_save(&mut self, buffer: &Buffer) {
    self.dispatch(buffer, "on_save", |hook, cx| hook.on_save(cx, buffer));
  }

  pub fn on_modified(&mut self, buffer: &Buffer) {
    self.dispatch(buffer, "on_modified", |hook, cx| hook.on_modified(cx, buffer));
  }

  pub fn on_selection_change(&mut self, buffer: &Buffer) {
    self.dispatch(buffer, "on_selection_change", |hook, cx| {
      hook.on_selection_change(cx, buffer)
    });
  }

  /// The first hook that answers wins.
  pub fn on_query_completions(&mut self, buffer: &Buffer) -> Option<Completions> {
    let mut answer = None;
    self.dispatch(buffer, "on_query_completions", |hook, cx| {
      if answer.is_none() {
        answer = hook.on_query_completions(cx, buffer)?;
      }
      Ok(())
    });
    answer
  }

  /// Drops the view's state; its lint task ends with the closed channel.
  pub fn on_close(&mut self, view: ViewId) {
    self.views.remove(&view);
  }

  /// The `format` command.
  pub fn format(&self, buffer: &Buffer) -> Option<FormatOutcome> {
    if !buffer.is_go_source() {
      return None;
    }
    handlers::format::format(
      self.host.as_ref(),
      &self.runner,
      self.settings.format_backend,
      buffer,
    )
    .inspect_err(|err| self.report("format", err))
    .ok()
  }

  /// The `lint` command. Returns the number of findings.
  pub fn lint(&self, buffer: &Buffer) -> Option<usize> {
    let path = buffer.path().filter(|_| buffer.is_go_source())?;
    handlers::lint::lint(self.host.as_ref(), &self.runner, buffer.id(), path)
      .inspect_err(|err| self.report("lint", err))
      .ok()
  }

  /// The `goto_definition` command, at the cursor or at a mouse position
  /// the host resolved to a char index.
  pub fn goto_definition(
    &self,
    buffer: &Buffer,
    mouse: Option<usize>,
  ) -> Option<Result<Target, DefinitionError>> {
    if !buffer.is_go_source() {
      return None;
    }
    Some(handlers::goto_def::goto_definition(
      self.host.as_ref(),
      &self.runner,
      &self.settings,
      buffer,
      mouse,
    ))
  }

  fn dispatch<F>(&mut self, buffer: &Buffer, event: &str, mut f: F)
  where
    F: FnMut(&dyn Hook, &mut Context) -> Result<()>,
  {
    if !buffer.is_go_source() {
      return;
    }

    let state = self.views.entry(buffer.id()).or_default();
    for hook in &self.hooks {
      let mut cx = Context {
        host:     &self.host,
        settings: &self.settings,
        runner:   &self.runner,
        runtime:  &self.runtime,
        state:    &mut *state,
      };
      if let Err(err) = f(hook.as_ref(), &mut cx) {
        log::error!("{} {event} failed: {err:#}", hook.name());
        host::status(self.host.as_ref(), format_args!("{}: {err}", hook.name()));
      }
    }
  }

  fn report(&self, command: &str, err: &anyhow::Error) {
    log::error!("{command} failed: {err:#}");
    host::status(self.host.as_ref(), format_args!("{command} failed: {err}"));
  }
}

impl Drop for GoTools {
  fn drop(&mut self) {
    // lint jobs still running are not waited for
    if let Some(runtime) = self.owned.take() {
      runtime.shutdown_background();
    }
  }
}
