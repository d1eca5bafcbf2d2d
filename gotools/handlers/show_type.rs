use anyhow::Result;
use gotools_lib::buffer::Buffer;

use super::{
  Context,
  Hook,
  completion,
};
use crate::runner::ToolRunner;

/// Status bar slot holding the type of the symbol under the cursor.
pub const STATUS_KEY: &str = "gotools.show_type";

/// Type of the identifier under the cursor as `name: type`, or an empty
/// string when gocode does not know it.
pub fn symbol_type(runner: &ToolRunner, buffer: &Buffer) -> Result<String> {
  let (start, _) = buffer.symbol_offset_at_cursor();
  let word = buffer.word_at_cursor();
  if word.is_empty() {
    return Ok(String::new());
  }

  let candidates = completion::candidates(None, runner, buffer, start)?.unwrap_or_default();
  Ok(
    candidates
      .iter()
      .find(|candidate| candidate.name == word)
      .map(|candidate| format!("{word}: {}", candidate.typ))
      .unwrap_or_default(),
  )
}

pub struct ShowTypeHook;

impl Hook for ShowTypeHook {
  fn name(&self) -> &'static str {
    "show-type"
  }

  fn on_selection_change(&self, cx: &mut Context, buffer: &Buffer) -> Result<()> {
    if !cx.settings.show_type {
      return Ok(());
    }
    let symbol = buffer.symbol_offset_at_cursor();
    if cx.state.last_symbol == Some(symbol) {
      return Ok(());
    }
    cx.state.last_symbol = Some(symbol);

    let typ = symbol_type(cx.runner, buffer)?;
    cx.host.set_status(buffer.id(), STATUS_KEY, &typ);
    Ok(())
  }
}
