//! gocode backed completions.

use anyhow::Result;
use gotools_lib::{
  buffer::Buffer,
  signature::lex_func_type,
};
use serde::Deserialize;

use super::{
  Completion,
  Completions,
  Context,
  Hook,
};
use crate::{
  host::{
    self,
    EditorHost,
  },
  runner::ToolRunner,
};

/// One gocode candidate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Candidate {
  pub name:  String,
  #[serde(rename = "type")]
  pub typ:   String,
  pub class: String,
}

/// Runs `gocode -f=json autocomplete <offset>` with the buffer on stdin.
///
/// `None` means gocode failed. The failure goes to the status bar of
/// `report` when set, and to the log otherwise.
pub fn candidates(
  report: Option<&dyn EditorHost>,
  runner: &ToolRunner,
  buffer: &Buffer,
  offset: usize,
) -> Result<Option<Vec<Candidate>>> {
  let invocation = runner
    .invocation("gocode")
    .args(["-f=json".to_owned(), "autocomplete".to_owned(), offset.to_string()])
    .stdin(buffer.contents());
  let output = runner.run(invocation)?;
  log::debug!("gocode output: {}", output.stdout);

  if !output.success() {
    let message = format!("no completions found: gocode exited with {}", output.status);
    match report {
      Some(host) => host::status(host, message),
      None => log::debug!("{message}"),
    }
    return Ok(None);
  }

  parse_candidates(&output.stdout).map(Some)
}

/// gocode prints `[]` when it has nothing and `[<prefix len>, [...]]`
/// otherwise.
fn parse_candidates(stdout: &str) -> Result<Vec<Candidate>> {
  if stdout.trim().is_empty() {
    return Ok(Vec::new());
  }
  let mut parts: Vec<serde_json::Value> = serde_json::from_str(stdout)?;
  if parts.len() < 2 {
    return Ok(Vec::new());
  }
  Ok(serde_json::from_value(parts.swap_remove(1))?)
}

fn class_symbol(class: &str) -> &'static str {
  match class {
    "func" => "ƒ",
    "var" => "ν",
    "type" => "ʈ",
    "package" => "ρ",
    _ => "?",
  }
}

impl Candidate {
  /// Functions complete to a call with one placeholder per parameter name.
  pub fn insert_text(&self) -> String {
    if self.class != "func" {
      return self.name.clone();
    }
    let (params, _) = lex_func_type(&self.typ);
    let placeholders: Vec<_> = params
      .iter()
      .enumerate()
      .map(|(idx, param)| {
        let name = param.split(' ').next().unwrap_or(param);
        format!("${{{}:{name}}}", idx + 1)
      })
      .collect();
    format!("{}({})", self.name, placeholders.join(", "))
  }

  pub fn label(&self) -> String {
    format!(
      "{:<30.30} {:<40.40} {}",
      self.name,
      self.typ,
      class_symbol(&self.class)
    )
  }

  pub fn to_completion(&self) -> Completion {
    Completion {
      label:       self.label(),
      insert_text: self.insert_text(),
    }
  }
}

/// Completions at the primary cursor.
pub fn complete(host: &dyn EditorHost, runner: &ToolRunner, buffer: &Buffer) -> Result<Completions> {
  let (offset, _) = buffer.offset_at_cursor();
  let Some(candidates) = candidates(Some(host), runner, buffer, offset)? else {
    return Ok(Completions::default());
  };
  if candidates.is_empty() {
    return Ok(Completions::default());
  }
  Ok(Completions {
    items:                    candidates.iter().map(Candidate::to_completion).collect(),
    inhibit_word_completions: true,
  })
}

pub struct CompletionHook;

impl Hook for CompletionHook {
  fn name(&self) -> &'static str {
    "autocomplete"
  }

  fn on_query_completions(&self, cx: &mut Context, buffer: &Buffer) -> Result<Option<Completions>> {
    if !cx.settings.autocomplete {
      return Ok(None);
    }
    complete(cx.host.as_ref(), cx.runner, buffer).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(name: &str, typ: &str, class: &str) -> Candidate {
    Candidate {
      name:  name.to_owned(),
      typ:   typ.to_owned(),
      class: class.to_owned(),
    }
  }

  #[test]
  fn func_snippets_use_parameter_names() {
    let join = candidate("Join", "func(elems []string, sep string) string", "func");
    assert_eq!(join.insert_text(), "Join(${1:elems}, ${2:sep})");

    let now = candidate("Now", "func() time.Time", "func");
    assert_eq!(now.insert_text(), "Now()");

    let stdout = candidate("Stdout", "*os.File", "var");
    assert_eq!(stdout.insert_text(), "Stdout");
  }

  #[test]
  fn labels_are_columns() {
    let label = candidate("Println", "func(a ...interface{}) (n int, err error)", "func").label();
    assert_eq!(label.chars().count(), 30 + 1 + 40 + 1 + 1);
    assert!(label.starts_with("Println "));
    assert!(label.ends_with(" ƒ"));

    let long = "x".repeat(50);
    let label = candidate(&long, "int", "const").label();
    assert!(label.starts_with(&"x".repeat(30)));
    assert!(label.ends_with(" ?"));
  }

  #[test]
  fn parses_gocode_json() {
    let stdout = r#"[3, [{"class": "func", "name": "Println", "type": "func(a ...interface{}) (n int, err error)"}, {"class": "package", "name": "fmt", "type": ""}]]"#;
    let candidates = parse_candidates(stdout).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[1], candidate("fmt", "", "package"));

    assert!(parse_candidates("[]").unwrap().is_empty());
    assert!(parse_candidates("").unwrap().is_empty());
    assert!(parse_candidates("not json").is_err());
  }
}
