use std::{
  path::PathBuf,
  sync::Arc,
};

use gotools_lib::buffer::Buffer;
use tokio::{
  runtime::Handle,
  sync::mpsc::Sender,
};

use crate::{
  host::EditorHost,
  runner::ToolRunner,
  settings::Settings,
};

pub mod completion;
pub mod format;
pub mod goto_def;
pub mod lint;
pub mod show_type;

/// State that outlives a single editor event, one per view.
#[derive(Debug, Default)]
pub struct ViewState {
  /// Byte range of the symbol show-type last looked up.
  pub last_symbol: Option<(usize, usize)>,
  /// Debounce channel of the view's lint hook and the file it lints.
  pub lint:        Option<(PathBuf, Sender<lint::LintEvent>)>,
}

/// Everything a hook may touch while handling one event.
pub struct Context<'a> {
  pub host:     &'a Arc<dyn EditorHost>,
  pub settings: &'a Arc<Settings>,
  pub runner:   &'a Arc<ToolRunner>,
  /// Runtime the debounced hooks are spawned on.
  pub runtime:  &'a Handle,
  pub state:    &'a mut ViewState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
  /// Display text: name, type and class symbol in fixed width columns.
  pub label:       String,
  /// Snippet inserted on accept, e.g. `Join(${1:elems}, ${2:sep})`.
  pub insert_text: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Completions {
  pub items:                    Vec<Completion>,
  /// The host should not add its own word based completions.
  pub inhibit_word_completions: bool,
}

/// An editor event subscriber. Every feature is one independent hook and
/// only overrides the events it reacts to.
pub trait Hook: Send + Sync {
  fn name(&self) -> &'static str;

  fn on_save(&self, _cx: &mut Context, _buffer: &Buffer) -> anyhow::Result<()> {
    Ok(())
  }

  fn on_modified(&self, _cx: &mut Context, _buffer: &Buffer) -> anyhow::Result<()> {
    Ok(())
  }

  fn on_selection_change(&self, _cx: &mut Context, _buffer: &Buffer) -> anyhow::Result<()> {
    Ok(())
  }

  fn on_query_completions(
    &self,
    _cx: &mut Context,
    _buffer: &Buffer,
  ) -> anyhow::Result<Option<Completions>> {
    Ok(None)
  }
}

/// The hooks registered by default, in dispatch order.
pub fn default_hooks() -> Vec<Box<dyn Hook>> {
  vec![
    Box::new(format::FormatHook),
    Box::new(lint::LintOnEdit),
    Box::new(completion::CompletionHook),
    Box::new(show_type::ShowTypeHook),
  ]
}
